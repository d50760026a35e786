//! Serialization and snapshot support for the simulation engine.
//!
//! Provides binary serialization via `bitcode` with a versioned header and
//! per-subsystem hashing for desync debugging.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::config::SimConfig;
use crate::engine::Engine;
use crate::fixed::Fixed64;
use crate::machine::CYCLE_PROGRESS;
use crate::sim;
use crate::state::FactoryState;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a botworks engine snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0xB075_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors that can occur during deserialization.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("snapshot decodes but holds an invalid state: {0}")]
    InvalidState(String),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header prepended to every serialized snapshot. Enables format detection
/// and version checking before the payload is trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Tick count at the time the snapshot was taken.
    pub tick: u64,
}

impl SnapshotHeader {
    /// Create a header for the current format version.
    pub fn new(tick: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

/// Read just the header of a serialized snapshot.
///
/// bitcode has no partial decoding, so the whole snapshot is decoded and
/// only the header is kept.
pub fn read_snapshot_header(data: &[u8]) -> Result<SnapshotHeader, DeserializeError> {
    let snapshot: EngineSnapshot =
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
    Ok(snapshot.header)
}

#[derive(Debug, Serialize, Deserialize)]
struct EngineSnapshot {
    header: SnapshotHeader,
    catalog: Catalog,
    config: SimConfig,
    state: FactoryState,
}

impl EngineSnapshot {
    /// Reject payloads the tick pipeline could not run on: a short or
    /// invalid catalog, a non-positive time scale, or a machine with
    /// negative speed or progress outside one cycle.
    fn check(&self) -> Result<(), DeserializeError> {
        let invalid = |detail: String| -> Result<(), DeserializeError> {
            Err(DeserializeError::InvalidState(detail))
        };

        if let Err(e) = self.catalog.check() {
            return invalid(e.to_string());
        }
        if self.state.time_scale <= Fixed64::ZERO {
            return invalid(format!("time scale {}", self.state.time_scale));
        }
        for m in self.state.machines.values() {
            if m.speed < Fixed64::ZERO {
                return invalid(format!("machine {} has speed {}", m.id, m.speed));
            }
            if m.progress < Fixed64::ZERO || m.progress >= CYCLE_PROGRESS {
                return invalid(format!("machine {} has progress {}", m.id, m.progress));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SubsystemHashes
// ---------------------------------------------------------------------------

/// Per-subsystem state hashes. Allows pinpointing which part of the state
/// diverged between two simulation instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsystemHashes {
    pub economy: u64,
    pub machines: u64,
    pub bots: u64,
}

// ---------------------------------------------------------------------------
// Engine serialization methods
// ---------------------------------------------------------------------------

impl Engine {
    /// Serialize catalog, config, and state to a binary blob.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        let snapshot = EngineSnapshot {
            header: SnapshotHeader::new(self.state.tick),
            catalog: self.catalog.clone(),
            config: self.config.clone(),
            state: self.state.clone(),
        };
        bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Rebuild an engine from [`Engine::serialize`] output. Returns an error
    /// (not a panic) on corrupt data, a version mismatch, or a payload that
    /// decodes into a state the engine cannot run.
    pub fn deserialize(data: &[u8]) -> Result<Self, DeserializeError> {
        let snapshot: EngineSnapshot =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        snapshot.header.validate()?;
        snapshot.check()?;
        Ok(Engine::from_parts(
            snapshot.catalog,
            snapshot.config,
            snapshot.state,
        ))
    }

    pub fn subsystem_hashes(&self) -> SubsystemHashes {
        SubsystemHashes {
            economy: sim::hash_economy(&self.state),
            machines: sim::hash_machines(&self.state),
            bots: sim::hash_bots(&self.state),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
