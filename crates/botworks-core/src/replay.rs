//! Replay recording and playback.
//!
//! A [`ReplayLog`] holds a serialized starting snapshot, the RNG seed, and
//! every command applied afterwards with the timestamp it was applied at.
//! Feeding the same log back through [`replay`] reproduces the exact same
//! state; [`replay_and_verify`] also checks recorded state hashes along the
//! way.

use serde::{Deserialize, Serialize};

use crate::command::{Command, Outcome, StepContext};
use crate::engine::Engine;
use crate::fixed::Ticks;
use crate::rng::SimRng;
use crate::serialize::{DeserializeError, SerializeError};

// ---------------------------------------------------------------------------
// ReplayLog
// ---------------------------------------------------------------------------

/// One recorded command and the timestamp it was applied with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayEntry {
    pub now: Ticks,
    pub command: Command,
}

/// A recorded sequence of commands starting from a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayLog {
    /// Serialized engine at the start of recording.
    pub initial_snapshot: Vec<u8>,
    /// Seed of the random source the commands drew from.
    pub seed: u64,
    pub entries: Vec<ReplayEntry>,
    /// `(entry index, state hash after that entry)`.
    pub hash_checkpoints: Vec<(usize, u64)>,
}

impl ReplayLog {
    /// Start a log from the current engine state.
    pub fn new(engine: &Engine, seed: u64) -> Result<Self, SerializeError> {
        Ok(Self {
            initial_snapshot: engine.serialize()?,
            seed,
            entries: Vec::new(),
            hash_checkpoints: Vec::new(),
        })
    }

    pub fn record(&mut self, now: Ticks, command: Command) {
        self.entries.push(ReplayEntry { now, command });
    }

    /// Record a command together with the state hash it produced.
    pub fn record_with_hash(&mut self, now: Ticks, command: Command, hash: u64) {
        let index = self.entries.len();
        self.record(now, command);
        self.hash_checkpoints.push((index, hash));
    }

    pub fn command_count(&self) -> usize {
        self.entries.len()
    }

    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        bitcode::serialize(self).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, DeserializeError> {
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Recorder
// ---------------------------------------------------------------------------

/// Drives a live engine and records everything applied to it.
#[derive(Debug)]
pub struct Recorder {
    engine: Engine,
    rng: SimRng,
    log: ReplayLog,
    /// Record a hash after every `checkpoint_every` commands. 0 disables.
    checkpoint_every: usize,
}

impl Recorder {
    pub fn new(engine: Engine, seed: u64) -> Result<Self, SerializeError> {
        let log = ReplayLog::new(&engine, seed)?;
        Ok(Self {
            engine,
            rng: SimRng::new(seed),
            log,
            checkpoint_every: 0,
        })
    }

    pub fn with_checkpoints(mut self, every: usize) -> Self {
        self.checkpoint_every = every;
        self
    }

    /// Apply `command` to the live engine and record it.
    pub fn apply(&mut self, command: Command, now: Ticks) -> Outcome {
        let mut ctx = StepContext::new(&mut self.rng, now);
        let outcome = self.engine.apply(&command, &mut ctx);

        let index = self.log.entries.len();
        if self.checkpoint_every > 0 && (index + 1) % self.checkpoint_every == 0 {
            let hash = self.engine.state_hash();
            self.log.record_with_hash(now, command, hash);
        } else {
            self.log.record(now, command);
        }
        outcome
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn log(&self) -> &ReplayLog {
        &self.log
    }

    /// Stop recording and hand back the live engine and the log.
    pub fn finish(self) -> (Engine, ReplayLog) {
        (self.engine, self.log)
    }
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

/// Where replay verification failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayMismatch {
    pub command_index: usize,
    pub expected_hash: u64,
    pub actual_hash: u64,
}

#[derive(Debug)]
pub struct ReplayResult {
    pub commands_executed: usize,
    /// Whether all hash checkpoints matched.
    pub is_verified: bool,
    pub first_mismatch: Option<ReplayMismatch>,
    /// The engine after the last command.
    pub engine: Engine,
}

/// Replay a log and verify hash checkpoints.
pub fn replay_and_verify(log: &ReplayLog) -> Result<ReplayResult, DeserializeError> {
    let mut engine = Engine::deserialize(&log.initial_snapshot)?;
    let mut rng = SimRng::new(log.seed);

    let mut first_mismatch: Option<ReplayMismatch> = None;
    let mut checkpoints = log.hash_checkpoints.iter().peekable();

    for (i, entry) in log.entries.iter().enumerate() {
        let mut ctx = StepContext::new(&mut rng, entry.now);
        engine.apply(&entry.command, &mut ctx);

        while let Some(&&(index, expected_hash)) = checkpoints.peek() {
            if index != i {
                break;
            }
            let actual_hash = engine.state_hash();
            if actual_hash != expected_hash && first_mismatch.is_none() {
                first_mismatch = Some(ReplayMismatch {
                    command_index: i,
                    expected_hash,
                    actual_hash,
                });
            }
            checkpoints.next();
        }
    }

    Ok(ReplayResult {
        commands_executed: log.entries.len(),
        is_verified: first_mismatch.is_none(),
        first_mismatch,
        engine,
    })
}

/// Replay a log without verification, returning the final engine.
pub fn replay(log: &ReplayLog) -> Result<Engine, DeserializeError> {
    let mut engine = Engine::deserialize(&log.initial_snapshot)?;
    let mut rng = SimRng::new(log.seed);
    for entry in &log.entries {
        let mut ctx = StepContext::new(&mut rng, entry.now);
        engine.apply(&entry.command, &mut ctx);
    }
    Ok(engine)
}

// ===========================================================================
// Tests
// ===========================================================================
