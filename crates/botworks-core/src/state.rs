//! The entity store: every machine, every bot, and the economy ledger.
//!
//! Only the tick engine and the command handlers mutate a [`FactoryState`].
//! Both entity maps are `BTreeMap`s keyed by monotonically allocated ids, so
//! iteration order is ascending id order everywhere, which the logistics
//! phase relies on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bot::Bot;
use crate::catalog::MachineKind;
use crate::fixed::{Fixed64, Ticks, fixed_int};
use crate::id::{BotId, MachineId};
use crate::machine::Machine;
use crate::resource::Resource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryState {
    pub machines: BTreeMap<MachineId, Machine>,
    pub bots: BTreeMap<BotId, Bot>,
    /// Integer ledger. Commands never take it below zero.
    pub credits: i64,
    /// Number of ticks processed, regardless of their delta.
    pub tick: Ticks,
    /// Multiplier applied to every tick delta. Always positive.
    pub time_scale: Fixed64,
    pub autopilot_enabled: bool,
    next_machine_id: u64,
    next_bot_id: u64,
}

impl FactoryState {
    /// An empty factory holding `credits`.
    pub fn new(credits: i64) -> Self {
        Self {
            machines: BTreeMap::new(),
            bots: BTreeMap::new(),
            credits,
            tick: 0,
            time_scale: fixed_int(1),
            autopilot_enabled: false,
            next_machine_id: 0,
            next_bot_id: 0,
        }
    }

    /// Reserve the next machine id. Ids are never reused.
    pub fn allocate_machine_id(&mut self) -> MachineId {
        let id = MachineId(self.next_machine_id);
        self.next_machine_id += 1;
        id
    }

    /// Reserve the next bot id. Ids are never reused.
    pub fn allocate_bot_id(&mut self) -> BotId {
        let id = BotId(self.next_bot_id);
        self.next_bot_id += 1;
        id
    }

    /// The id the next allocated machine will receive.
    pub fn peek_machine_id(&self) -> MachineId {
        MachineId(self.next_machine_id)
    }

    /// The id the next allocated bot will receive.
    pub fn peek_bot_id(&self) -> BotId {
        BotId(self.next_bot_id)
    }

    /// Store a machine under its own id.
    pub fn insert_machine(&mut self, machine: Machine) {
        self.machines.insert(machine.id, machine);
    }

    /// Create an idle, empty-handed bot at `(x, y)` and return its id.
    pub fn spawn_bot_at(&mut self, x: Fixed64, y: Fixed64) -> BotId {
        let id = self.allocate_bot_id();
        self.bots.insert(id, Bot::new(id, x, y));
        id
    }

    pub fn machine_count(&self) -> usize {
        self.machines.len()
    }

    pub fn bot_count(&self) -> usize {
        self.bots.len()
    }

    pub fn idle_bot_count(&self) -> usize {
        self.bots.values().filter(|b| b.is_idle()).count()
    }

    /// Bots currently holding a payload, whatever their task.
    pub fn carrying_bot_count(&self) -> usize {
        self.bots.values().filter(|b| b.payload.is_some()).count()
    }

    pub fn count_kind(&self, kind: MachineKind) -> usize {
        self.machines.values().filter(|m| m.kind == kind).count()
    }

    /// Units of `resource` in every machine inventory plus every bot payload.
    pub fn resource_total(&self, resource: Resource) -> u64 {
        let stored: u64 = self
            .machines
            .values()
            .map(|m| m.inventory.quantity(resource) as u64)
            .sum();
        let carried = self
            .bots
            .values()
            .filter(|b| b.payload == Some(resource))
            .count() as u64;
        stored + carried
    }

    /// `(next machine id, next bot id)`.
    pub(crate) fn id_counters(&self) -> (u64, u64) {
        (self.next_machine_id, self.next_bot_id)
    }
}

impl Default for FactoryState {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::BotTask;
    use crate::catalog::Catalog;

    fn place(state: &mut FactoryState, kind: MachineKind) -> MachineId {
        let catalog = Catalog::standard();
        let id = state.allocate_machine_id();
        state.insert_machine(Machine::from_spec(
            id,
            kind,
            catalog.spec(kind),
            Fixed64::ZERO,
            Fixed64::ZERO,
            0,
        ));
        id
    }

    #[test]
    fn new_state_defaults() {
        let state = FactoryState::new(1000);
        assert_eq!(state.credits, 1000);
        assert_eq!(state.tick, 0);
        assert_eq!(state.time_scale, fixed_int(1));
        assert!(!state.autopilot_enabled);
        assert_eq!(state.machine_count(), 0);
        assert_eq!(state.bot_count(), 0);
    }

    #[test]
    fn ids_are_monotonic() {
        let mut state = FactoryState::new(0);
        let a = state.spawn_bot_at(Fixed64::ZERO, Fixed64::ZERO);
        let b = state.spawn_bot_at(Fixed64::ZERO, Fixed64::ZERO);
        assert!(a < b);
        assert_eq!(state.peek_bot_id(), BotId(2));

        let m0 = place(&mut state, MachineKind::Extractor);
        let m1 = place(&mut state, MachineKind::Extractor);
        assert_eq!((m0, m1), (MachineId(0), MachineId(1)));
    }

    #[test]
    fn counts_by_kind_and_task() {
        let mut state = FactoryState::new(0);
        place(&mut state, MachineKind::Extractor);
        let smelter = place(&mut state, MachineKind::Smelter);
        place(&mut state, MachineKind::Extractor);
        assert_eq!(state.count_kind(MachineKind::Extractor), 2);
        assert_eq!(state.count_kind(MachineKind::Smelter), 1);
        assert_eq!(state.count_kind(MachineKind::Sink), 0);

        let busy = state.spawn_bot_at(Fixed64::ZERO, Fixed64::ZERO);
        state.spawn_bot_at(Fixed64::ZERO, Fixed64::ZERO);
        state.bots.get_mut(&busy).unwrap().task = BotTask::MovingToDeliver {
            machine: smelter,
            resource: Resource::IronOre,
        };
        state.bots.get_mut(&busy).unwrap().payload = Some(Resource::IronOre);
        assert_eq!(state.idle_bot_count(), 1);
        assert_eq!(state.carrying_bot_count(), 1);
    }

    #[test]
    fn resource_total_includes_payloads() {
        let mut state = FactoryState::new(0);
        let m = place(&mut state, MachineKind::Smelter);
        state
            .machines
            .get_mut(&m)
            .unwrap()
            .inventory
            .set(Resource::IronOre, 4);
        let bot = state.spawn_bot_at(Fixed64::ZERO, Fixed64::ZERO);
        state.bots.get_mut(&bot).unwrap().payload = Some(Resource::IronOre);
        assert_eq!(state.resource_total(Resource::IronOre), 5);
        assert_eq!(state.resource_total(Resource::Gear), 0);
    }
}
