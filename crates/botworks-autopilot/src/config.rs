use botworks_core::fixed::{Fixed64, fixed_int};
use serde::{Deserialize, Serialize};

/// Rectangle new machines are dropped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementArea {
    #[serde(with = "botworks_core::fixed::as_f64")]
    pub x: Fixed64,
    #[serde(with = "botworks_core::fixed::as_f64")]
    pub y: Fixed64,
    #[serde(with = "botworks_core::fixed::as_f64")]
    pub width: Fixed64,
    #[serde(with = "botworks_core::fixed::as_f64")]
    pub height: Fixed64,
}

impl Default for PlacementArea {
    fn default() -> Self {
        Self {
            x: fixed_int(50),
            y: fixed_int(100),
            width: fixed_int(800),
            height: fixed_int(600),
        }
    }
}

/// Thresholds for the growth heuristics.
///
/// Percentages are whole numbers so the decision rules stay in integer
/// arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopilotConfig {
    /// Credits that must remain after any purchase, exclusive.
    pub cash_buffer: i64,
    /// Balance above which the iron chain is extended even when balanced.
    pub expansion_threshold: i64,
    /// No low-idle spawning at or above this many bots.
    pub bot_cap: usize,
    /// Batch size when the factory has no bots at all.
    pub bootstrap_batch: u32,
    pub min_batch: u32,
    /// Low-idle batch as a percentage of the current population.
    pub batch_percent: u32,
    /// Spawn more bots when fewer than this percentage are idle.
    pub idle_percent: u32,
    /// Assemblers required before the copper chain is started.
    pub copper_gate: usize,
    pub placement: PlacementArea,
    /// Wall-clock time between invocations, in milliseconds.
    pub interval_ms: u64,
    /// Seed for the placement generator.
    pub seed: u64,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            cash_buffer: 500,
            expansion_threshold: 2000,
            bot_cap: 2000,
            bootstrap_batch: 10,
            min_batch: 10,
            batch_percent: 10,
            idle_percent: 10,
            copper_gate: 3,
            placement: PlacementArea::default(),
            interval_ms: 1000,
            seed: 0x5EED,
        }
    }
}
