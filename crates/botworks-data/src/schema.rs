//! Serde schema types for settings and scenario files.
//!
//! Everything here is plain data. Positions, speeds and time scales are
//! written as floats and converted to fixed point once, when the engine is
//! built.

use std::collections::BTreeMap;

use botworks_autopilot::AutopilotConfig;
use botworks_core::catalog::{Catalog, CatalogError, MachineKind};
use botworks_core::command::Command;
use botworks_core::config::SimConfig;
use botworks_core::engine::Engine;
use botworks_core::fixed::f64_to_fixed64;
use botworks_core::machine::MachineBlueprint;
use botworks_core::resource::Resource;
use serde::{Deserialize, Serialize};

// ===========================================================================
// Settings
// ===========================================================================

/// Top-level settings file. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sim: SimConfig,
    pub autopilot: AutopilotConfig,
    /// Edits applied on top of the standard catalog, in order.
    pub catalog: Vec<SpecOverride>,
}

/// Partial replacement of one catalog entry. Absent fields keep the
/// standard value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecOverride {
    pub kind: MachineKind,
    #[serde(default)]
    pub cost: Option<i64>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub inputs: Option<Vec<Resource>>,
    #[serde(default)]
    pub outputs: Option<Vec<Resource>>,
}

impl Settings {
    /// The standard catalog with every override applied.
    pub fn build_catalog(&self) -> Result<Catalog, CatalogError> {
        let mut catalog = Catalog::standard();
        for o in &self.catalog {
            catalog.mutate(o.kind, |spec| {
                if let Some(cost) = o.cost {
                    spec.cost = cost;
                }
                if let Some(speed) = o.speed {
                    spec.speed = f64_to_fixed64(speed);
                }
                if let Some(inputs) = &o.inputs {
                    spec.inputs = inputs.clone();
                }
                if let Some(outputs) = &o.outputs {
                    spec.outputs = outputs.clone();
                }
            })?;
        }
        Ok(catalog)
    }

    /// An empty factory using these settings.
    pub fn build_engine(&self) -> Result<Engine, CatalogError> {
        Ok(Engine::new(self.build_catalog()?, self.sim.clone()))
    }
}

// ===========================================================================
// Scenario
// ===========================================================================

/// One machine placed for free at scenario start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMachine {
    pub kind: MachineKind,
    pub x: f64,
    pub y: f64,
    /// Overrides the catalog speed for this machine only.
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub stock: BTreeMap<Resource, u32>,
}

impl ScenarioMachine {
    pub fn blueprint(&self) -> MachineBlueprint {
        let mut bp = MachineBlueprint::new(self.kind, f64_to_fixed64(self.x), f64_to_fixed64(self.y));
        if let Some(speed) = self.speed {
            bp = bp.with_speed(f64_to_fixed64(speed));
        }
        for (&resource, &quantity) in &self.stock {
            bp = bp.with_stock(resource, quantity);
        }
        bp
    }
}

/// Initial layout of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub machines: Vec<ScenarioMachine>,
    #[serde(default)]
    pub bots: u32,
    #[serde(default)]
    pub time_scale: Option<f64>,
    #[serde(default)]
    pub autopilot: bool,
}

impl Scenario {
    /// One iron chain ending in a sink, with boosted speeds, and 100 bots.
    pub fn demo() -> Self {
        let machine = |kind, x: f64, speed: f64| ScenarioMachine {
            kind,
            x,
            y: 300.0,
            speed: Some(speed),
            stock: BTreeMap::new(),
        };
        Self {
            name: "demo".to_string(),
            machines: vec![
                machine(MachineKind::Extractor, 100.0, 0.1),
                machine(MachineKind::Smelter, 300.0, 0.05),
                machine(MachineKind::Assembler, 500.0, 0.03),
                machine(MachineKind::Sink, 700.0, 1.0),
            ],
            bots: 100,
            time_scale: None,
            autopilot: false,
        }
    }

    /// The commands that set this scenario up, in application order:
    /// placements, then bots, then the time scale and autopilot flag.
    pub fn commands(&self) -> Vec<Command> {
        let mut commands: Vec<Command> = self
            .machines
            .iter()
            .map(|m| Command::AddMachine {
                blueprint: m.blueprint(),
            })
            .collect();
        if self.bots > 0 {
            commands.push(Command::SpawnBots { count: self.bots });
        }
        if let Some(scale) = self.time_scale {
            commands.push(Command::SetTimeScale {
                multiplier: f64_to_fixed64(scale),
            });
        }
        if self.autopilot {
            commands.push(Command::SetAutopilotEnabled { enabled: true });
        }
        commands
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::demo()
    }
}
