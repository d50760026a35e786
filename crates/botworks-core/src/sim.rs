//! State hashing for desync detection.
//!
//! The factory state is hashed in three independent parts (economy,
//! machines, bots) so that a mismatch between two runs can be traced to the
//! part that diverged. The whole-state hash folds the three together.

use crate::bot::{Bot, BotTask};
use crate::fixed::Fixed64;
use crate::machine::Machine;
use crate::resource::{Inventory, Resource};
use crate::state::FactoryState;

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A simple deterministic hash of simulation state for desync detection.
///
/// Uses FNV-1a (64-bit) for speed and simplicity. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    /// Start a new hash.
    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    /// Feed bytes into the hash.
    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write(&[v as u8]);
    }

    /// Feed a Fixed64 into the hash by its raw bits.
    pub fn write_fixed64(&mut self, v: Fixed64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    /// Finalize and return the hash value.
    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Subsystem hashes
// ---------------------------------------------------------------------------

/// Ledger, clock, time scale, flags, and id counters.
pub fn hash_economy(state: &FactoryState) -> u64 {
    let mut h = StateHash::new();
    h.write_u64(state.tick);
    h.write_i64(state.credits);
    h.write_fixed64(state.time_scale);
    h.write_bool(state.autopilot_enabled);
    let (next_machine, next_bot) = state.id_counters();
    h.write_u64(next_machine);
    h.write_u64(next_bot);
    h.finish()
}

/// Every machine field, in ascending id order.
pub fn hash_machines(state: &FactoryState) -> u64 {
    let mut h = StateHash::new();
    h.write_u64(state.machines.len() as u64);
    for machine in state.machines.values() {
        write_machine(&mut h, machine);
    }
    h.finish()
}

/// Every bot field, in ascending id order.
pub fn hash_bots(state: &FactoryState) -> u64 {
    let mut h = StateHash::new();
    h.write_u64(state.bots.len() as u64);
    for bot in state.bots.values() {
        write_bot(&mut h, bot);
    }
    h.finish()
}

/// Hash of the whole state.
pub fn hash_state(state: &FactoryState) -> u64 {
    let mut h = StateHash::new();
    h.write_u64(hash_economy(state));
    h.write_u64(hash_machines(state));
    h.write_u64(hash_bots(state));
    h.finish()
}

fn write_machine(h: &mut StateHash, m: &Machine) {
    h.write_u64(m.id.0);
    h.write_fixed64(m.x);
    h.write_fixed64(m.y);
    h.write_u32(m.kind.index() as u32);
    write_resources(h, &m.inputs);
    write_resources(h, &m.outputs);
    h.write_fixed64(m.speed);
    write_inventory(h, &m.inventory);
    h.write_fixed64(m.progress);
    h.write_u64(m.placed_at);
}

fn write_bot(h: &mut StateHash, b: &Bot) {
    h.write_u64(b.id.0);
    h.write_fixed64(b.x);
    h.write_fixed64(b.y);
    match b.payload {
        Some(r) => {
            h.write_u32(1);
            h.write_u32(r.index() as u32);
        }
        None => h.write_u32(0),
    }
    match b.task {
        BotTask::Idle => h.write_u32(0),
        BotTask::MovingToPickup { machine, resource } => {
            h.write_u32(1);
            h.write_u64(machine.0);
            h.write_u32(resource.index() as u32);
        }
        BotTask::MovingToDeliver { machine, resource } => {
            h.write_u32(2);
            h.write_u64(machine.0);
            h.write_u32(resource.index() as u32);
        }
    }
}

fn write_resources(h: &mut StateHash, list: &[Resource]) {
    h.write_u32(list.len() as u32);
    for r in list {
        h.write_u32(r.index() as u32);
    }
}

fn write_inventory(h: &mut StateHash, inv: &Inventory) {
    for r in Resource::ALL {
        h.write_u32(inv.quantity(r));
    }
}
