//! State comparison and determinism checking.
//!
//! Compares two engines to find where they diverge, and checks that a
//! recorded session replays to the same state it ended in.

use crate::engine::Engine;
use crate::fixed::Fixed64;
use crate::id::{BotId, MachineId};
use crate::replay::{self, ReplayLog};
use crate::serialize::DeserializeError;

// ---------------------------------------------------------------------------
// State diff types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineDiff {
    OnlyInA(MachineId),
    OnlyInB(MachineId),
    /// Present in both with different field values.
    StateMismatch {
        machine: MachineId,
        description: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotDiff {
    OnlyInA(BotId),
    OnlyInB(BotId),
    StateMismatch { bot: BotId, description: String },
}

/// Per-subsystem match results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsystemDiff {
    pub economy_matches: bool,
    pub machines_match: bool,
    pub bots_match: bool,
}

impl SubsystemDiff {
    pub fn all_match(&self) -> bool {
        self.economy_matches && self.machines_match && self.bots_match
    }
}

/// Full state diff between two engines.
#[derive(Debug, Clone)]
pub struct StateDiff {
    pub is_identical: bool,
    pub subsystem_diffs: SubsystemDiff,
    pub machine_diffs: Vec<MachineDiff>,
    pub bot_diffs: Vec<BotDiff>,
}

// ---------------------------------------------------------------------------
// Quick compare (subsystem-level only)
// ---------------------------------------------------------------------------

/// Quick subsystem-level comparison using hashes.
pub fn quick_compare(a: &Engine, b: &Engine) -> SubsystemDiff {
    let ha = a.subsystem_hashes();
    let hb = b.subsystem_hashes();

    SubsystemDiff {
        economy_matches: ha.economy == hb.economy,
        machines_match: ha.machines == hb.machines,
        bots_match: ha.bots == hb.bots,
    }
}

// ---------------------------------------------------------------------------
// Full diff
// ---------------------------------------------------------------------------

/// Compute a detailed diff between two engine states.
pub fn diff_engines(a: &Engine, b: &Engine) -> StateDiff {
    let subsystem_diffs = quick_compare(a, b);
    let sa = &a.state;
    let sb = &b.state;

    let mut machine_diffs = Vec::new();
    for (&id, ma) in &sa.machines {
        let Some(mb) = sb.machines.get(&id) else {
            machine_diffs.push(MachineDiff::OnlyInA(id));
            continue;
        };
        let mut mismatches = Vec::new();
        if (ma.x, ma.y) != (mb.x, mb.y) {
            mismatches.push("position");
        }
        if ma.kind != mb.kind || ma.inputs != mb.inputs || ma.outputs != mb.outputs {
            mismatches.push("recipe");
        }
        if ma.speed != mb.speed {
            mismatches.push("speed");
        }
        if ma.inventory != mb.inventory {
            mismatches.push("inventory");
        }
        if ma.progress != mb.progress {
            mismatches.push("progress");
        }
        if ma.placed_at != mb.placed_at {
            mismatches.push("placed_at");
        }
        if !mismatches.is_empty() {
            machine_diffs.push(MachineDiff::StateMismatch {
                machine: id,
                description: mismatches.join(", "),
            });
        }
    }
    machine_diffs.extend(
        sb.machines
            .keys()
            .filter(|id| !sa.machines.contains_key(id))
            .map(|&id| MachineDiff::OnlyInB(id)),
    );

    let mut bot_diffs = Vec::new();
    for (&id, ba) in &sa.bots {
        let Some(bb) = sb.bots.get(&id) else {
            bot_diffs.push(BotDiff::OnlyInA(id));
            continue;
        };
        let mut mismatches = Vec::new();
        if (ba.x, ba.y) != (bb.x, bb.y) {
            mismatches.push("position");
        }
        if ba.payload != bb.payload {
            mismatches.push("payload");
        }
        if ba.task != bb.task {
            mismatches.push("task");
        }
        if !mismatches.is_empty() {
            bot_diffs.push(BotDiff::StateMismatch {
                bot: id,
                description: mismatches.join(", "),
            });
        }
    }
    bot_diffs.extend(
        sb.bots
            .keys()
            .filter(|id| !sa.bots.contains_key(id))
            .map(|&id| BotDiff::OnlyInB(id)),
    );

    let is_identical =
        machine_diffs.is_empty() && bot_diffs.is_empty() && subsystem_diffs.all_match();

    StateDiff {
        is_identical,
        subsystem_diffs,
        machine_diffs,
        bot_diffs,
    }
}

// ---------------------------------------------------------------------------
// Determinism validation
// ---------------------------------------------------------------------------

/// Result of a side-by-side determinism run.
#[derive(Debug)]
pub struct DeterminismResult {
    pub is_deterministic: bool,
    /// Tick at which divergence was first detected (if any).
    pub divergence_tick: Option<u64>,
    /// `(tick, hash_run1, hash_run2)` for each tick.
    pub hash_log: Vec<(u64, u64, u64)>,
}

/// Tick two copies of the same snapshot side by side and compare hashes
/// after every tick.
pub fn validate_determinism(
    snapshot_data: &[u8],
    ticks: u64,
    delta: Fixed64,
) -> Result<DeterminismResult, DeserializeError> {
    let mut engine_a = Engine::deserialize(snapshot_data)?;
    let mut engine_b = Engine::deserialize(snapshot_data)?;

    let mut hash_log = Vec::new();
    let mut divergence_tick = None;

    for _ in 0..ticks {
        engine_a.tick(delta);
        engine_b.tick(delta);

        let hash_a = engine_a.state_hash();
        let hash_b = engine_b.state_hash();
        let tick = engine_a.state.tick;
        hash_log.push((tick, hash_a, hash_b));

        if hash_a != hash_b && divergence_tick.is_none() {
            divergence_tick = Some(tick);
        }
    }

    Ok(DeterminismResult {
        is_deterministic: divergence_tick.is_none(),
        divergence_tick,
        hash_log,
    })
}

/// Outcome of replaying a recorded session against the engine it produced.
#[derive(Debug)]
pub struct DeterminismReport {
    pub live_hash: u64,
    pub replay_hash: u64,
    /// Structural diff, only computed when the hashes disagree.
    pub diff: Option<StateDiff>,
}

impl DeterminismReport {
    pub fn is_deterministic(&self) -> bool {
        self.live_hash == self.replay_hash
    }
}

/// Replay `log` from its initial snapshot and compare the result with the
/// live engine the session ended in.
pub fn verify_determinism(
    live: &Engine,
    log: &ReplayLog,
) -> Result<DeterminismReport, DeserializeError> {
    let replayed = replay::replay(log)?;
    let live_hash = live.state_hash();
    let replay_hash = replayed.state_hash();
    let diff = (live_hash != replay_hash).then(|| diff_engines(live, &replayed));
    Ok(DeterminismReport {
        live_hash,
        replay_hash,
        diff,
    })
}

// ===========================================================================
// Tests
// ===========================================================================
