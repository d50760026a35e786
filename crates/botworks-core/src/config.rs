use crate::fixed::{Fixed64, fixed_int};
use serde::{Deserialize, Serialize};

/// Tunables for the tick engine and command handlers.
///
/// `Default` holds the reference balance. Every field is optional in
/// settings files; missing fields fall back to the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// An input below this many units is reported as demand.
    pub low_water_mark: u32,
    /// Distance a bot covers per unit of simulated time.
    #[serde(with = "crate::fixed::as_f64")]
    pub bot_speed: Fixed64,
    /// Credits paid per cycle completed by a machine with no outputs.
    pub sink_reward: i64,
    /// Width of the area new bots are scattered over.
    #[serde(with = "crate::fixed::as_f64")]
    pub spawn_width: Fixed64,
    /// Height of the area new bots are scattered over.
    #[serde(with = "crate::fixed::as_f64")]
    pub spawn_height: Fixed64,
    /// Ledger balance of a fresh factory.
    pub starting_credits: i64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            low_water_mark: 10,
            bot_speed: fixed_int(5),
            sink_reward: 50,
            spawn_width: fixed_int(800),
            spawn_height: fixed_int(600),
            starting_credits: 1000,
        }
    }
}
