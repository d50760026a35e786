//! Data-driven setup for botworks: settings (sim tunables, autopilot
//! thresholds, catalog overrides) and scenarios (initial machines and
//! bots), read from RON, TOML, or JSON.

pub mod loader;
pub mod schema;

pub use loader::{
    DataLoadError, Format, GameSetup, deserialize_file, detect_format, find_data_file,
    load_data_dir, load_scenario, load_settings,
};
pub use schema::{Scenario, ScenarioMachine, Settings, SpecOverride};
