//! Read-only query API for inspecting simulation state.
//!
//! Provides snapshot types that aggregate engine state into convenient views
//! for rendering, overlays, and the autopilot. All types are owned copies --
//! no references into internal engine storage.

use crate::bot::BotTask;
use crate::catalog::MachineKind;
use crate::engine::Engine;
use crate::fixed::{self, Fixed64, Ticks};
use crate::id::{BotId, MachineId};
use crate::machine::CYCLE_PROGRESS;
use crate::resource::Resource;

// ---------------------------------------------------------------------------
// Factory summary
// ---------------------------------------------------------------------------

/// Aggregate counters for the whole factory. Everything the autopilot
/// reads comes from here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactorySummary {
    pub tick: Ticks,
    pub credits: i64,
    pub time_scale: Fixed64,
    pub autopilot_enabled: bool,
    pub bot_count: usize,
    pub idle_bots: usize,
    /// Bots holding a payload, idle or not.
    pub carrying_bots: usize,
    machine_counts: [usize; MachineKind::COUNT],
}

impl FactorySummary {
    /// Placed machines of `kind`.
    pub fn count(&self, kind: MachineKind) -> usize {
        self.machine_counts[kind.index()]
    }

    pub fn machine_count(&self) -> usize {
        self.machine_counts.iter().sum()
    }
}

// ---------------------------------------------------------------------------
// Machine snapshot
// ---------------------------------------------------------------------------

/// A read-only view of a single machine.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineSnapshot {
    pub id: MachineId,
    pub kind: MachineKind,
    pub x: Fixed64,
    pub y: Fixed64,
    /// Progress toward the next cycle as a 0..1 fraction.
    pub progress: Fixed64,
    /// Non-zero inventory entries in resource declaration order.
    pub inventory: Vec<(Resource, u32)>,
}

// ---------------------------------------------------------------------------
// Bot snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct BotSnapshot {
    pub id: BotId,
    pub x: Fixed64,
    pub y: Fixed64,
    pub payload: Option<Resource>,
    pub task: BotTask,
    /// Distance left to the task's machine. `None` when idle or when the
    /// machine is gone.
    pub remaining: Option<Fixed64>,
}

// ---------------------------------------------------------------------------
// Engine query methods
// ---------------------------------------------------------------------------

impl Engine {
    pub fn summary(&self) -> FactorySummary {
        let state = &self.state;
        let mut machine_counts = [0usize; MachineKind::COUNT];
        for machine in state.machines.values() {
            machine_counts[machine.kind.index()] += 1;
        }
        FactorySummary {
            tick: state.tick,
            credits: state.credits,
            time_scale: state.time_scale,
            autopilot_enabled: state.autopilot_enabled,
            bot_count: state.bot_count(),
            idle_bots: state.idle_bot_count(),
            carrying_bots: state.carrying_bot_count(),
            machine_counts,
        }
    }

    pub fn snapshot_machine(&self, id: MachineId) -> Option<MachineSnapshot> {
        let m = self.state.machines.get(&id)?;
        Some(MachineSnapshot {
            id: m.id,
            kind: m.kind,
            x: m.x,
            y: m.y,
            progress: m.progress / CYCLE_PROGRESS,
            inventory: m.inventory.iter().collect(),
        })
    }

    /// Snapshots of every machine in ascending id order.
    pub fn snapshot_all_machines(&self) -> Vec<MachineSnapshot> {
        self.state
            .machines
            .keys()
            .filter_map(|&id| self.snapshot_machine(id))
            .collect()
    }

    /// Snapshots of every bot in ascending id order.
    pub fn snapshot_bots(&self) -> Vec<BotSnapshot> {
        self.state
            .bots
            .values()
            .map(|b| BotSnapshot {
                id: b.id,
                x: b.x,
                y: b.y,
                payload: b.payload,
                task: b.task,
                remaining: b
                    .task
                    .target()
                    .and_then(|id| self.state.machines.get(&id))
                    .map(|m| fixed::distance(b.x, b.y, m.x, m.y)),
            })
            .collect()
    }
}
