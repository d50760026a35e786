//! Static recipe catalog: what each machine kind costs, consumes, produces,
//! and how fast it works.
//!
//! Machines copy their recipe out of the catalog when they are created, so
//! rebalancing the catalog later never alters machines already placed.

use crate::fixed::{Fixed64, f64_to_fixed64};
use crate::resource::Resource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of machine that can be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MachineKind {
    #[serde(rename = "extractor")]
    Extractor,
    #[serde(rename = "smelter")]
    Smelter,
    #[serde(rename = "assembler")]
    Assembler,
    #[serde(rename = "sink")]
    Sink,
    #[serde(rename = "extractor_copper")]
    CopperExtractor,
    #[serde(rename = "smelter_copper")]
    CopperSmelter,
    #[serde(rename = "assembler_advanced")]
    AdvancedAssembler,
}

impl MachineKind {
    pub const COUNT: usize = 7;

    pub const ALL: [MachineKind; MachineKind::COUNT] = [
        MachineKind::Extractor,
        MachineKind::Smelter,
        MachineKind::Assembler,
        MachineKind::Sink,
        MachineKind::CopperExtractor,
        MachineKind::CopperSmelter,
        MachineKind::AdvancedAssembler,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            MachineKind::Extractor => "extractor",
            MachineKind::Smelter => "smelter",
            MachineKind::Assembler => "assembler",
            MachineKind::Sink => "sink",
            MachineKind::CopperExtractor => "extractor_copper",
            MachineKind::CopperSmelter => "smelter_copper",
            MachineKind::AdvancedAssembler => "assembler_advanced",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for MachineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Recipe and price for one machine kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSpec {
    /// Purchase price in credits.
    pub cost: i64,
    /// Resources consumed, one unit each, per completed cycle.
    pub inputs: Vec<Resource>,
    /// Resources produced, one unit each, per completed cycle.
    pub outputs: Vec<Resource>,
    /// Progress units gained per unit of simulated time.
    #[serde(with = "crate::fixed::as_f64")]
    pub speed: Fixed64,
}

impl MachineSpec {
    fn new(cost: i64, inputs: &[Resource], outputs: &[Resource], speed: f64) -> Self {
        Self {
            cost,
            inputs: inputs.to_vec(),
            outputs: outputs.to_vec(),
            speed: f64_to_fixed64(speed),
        }
    }
}

/// Errors raised when installing a spec into a catalog.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("{kind} cannot cost {cost} credits")]
    NegativeCost { kind: MachineKind, cost: i64 },
    #[error("{kind} cannot run at negative speed {speed}")]
    NegativeSpeed { kind: MachineKind, speed: Fixed64 },
    #[error("{kind} lists {resource} more than once")]
    DuplicateResource {
        kind: MachineKind,
        resource: Resource,
    },
    #[error("catalog holds {found} specs, expected {}", MachineKind::COUNT)]
    WrongSpecCount { found: usize },
}

/// One spec per machine kind, indexed by [`MachineKind::index`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    specs: Vec<MachineSpec>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl Catalog {
    /// The reference balance table.
    pub fn standard() -> Self {
        use Resource::*;
        let specs = MachineKind::ALL
            .iter()
            .map(|kind| match kind {
                MachineKind::Extractor => MachineSpec::new(100, &[], &[IronOre], 0.05),
                MachineKind::Smelter => MachineSpec::new(500, &[IronOre], &[IronPlate], 0.03),
                MachineKind::Assembler => MachineSpec::new(1200, &[IronPlate], &[Gear], 0.02),
                MachineKind::Sink => MachineSpec::new(0, &[Gear], &[], 1.0),
                MachineKind::CopperExtractor => MachineSpec::new(100, &[], &[CopperOre], 0.05),
                MachineKind::CopperSmelter => {
                    MachineSpec::new(500, &[CopperOre], &[CopperWire], 0.03)
                }
                MachineKind::AdvancedAssembler => {
                    MachineSpec::new(3000, &[Gear, CopperWire], &[ComputeCore], 0.01)
                }
            })
            .collect();
        Self { specs }
    }

    pub fn spec(&self, kind: MachineKind) -> &MachineSpec {
        &self.specs[kind.index()]
    }

    pub fn cost(&self, kind: MachineKind) -> i64 {
        self.spec(kind).cost
    }

    /// Replace the spec for `kind` after validating it.
    pub fn set_spec(&mut self, kind: MachineKind, spec: MachineSpec) -> Result<(), CatalogError> {
        validate(kind, &spec)?;
        self.specs[kind.index()] = spec;
        Ok(())
    }

    /// Check a catalog that did not come from [`Catalog::standard`], such as
    /// one decoded from a snapshot: one valid spec per kind.
    pub fn check(&self) -> Result<(), CatalogError> {
        if self.specs.len() != MachineKind::COUNT {
            return Err(CatalogError::WrongSpecCount {
                found: self.specs.len(),
            });
        }
        for (kind, spec) in MachineKind::ALL.into_iter().zip(&self.specs) {
            validate(kind, spec)?;
        }
        Ok(())
    }

    /// Edit the spec for `kind` in place. The edit is discarded if the
    /// result fails validation.
    pub fn mutate<F>(&mut self, kind: MachineKind, f: F) -> Result<(), CatalogError>
    where
        F: FnOnce(&mut MachineSpec),
    {
        let mut spec = self.spec(kind).clone();
        f(&mut spec);
        self.set_spec(kind, spec)
    }
}

fn validate(kind: MachineKind, spec: &MachineSpec) -> Result<(), CatalogError> {
    if spec.cost < 0 {
        return Err(CatalogError::NegativeCost {
            kind,
            cost: spec.cost,
        });
    }
    if spec.speed < Fixed64::ZERO {
        return Err(CatalogError::NegativeSpeed {
            kind,
            speed: spec.speed,
        });
    }
    for list in [&spec.inputs, &spec.outputs] {
        for (i, r) in list.iter().enumerate() {
            if list[..i].contains(r) {
                return Err(CatalogError::DuplicateResource {
                    kind,
                    resource: *r,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_prices() {
        let c = Catalog::standard();
        assert_eq!(c.cost(MachineKind::Extractor), 100);
        assert_eq!(c.cost(MachineKind::Smelter), 500);
        assert_eq!(c.cost(MachineKind::Assembler), 1200);
        assert_eq!(c.cost(MachineKind::Sink), 0);
        assert_eq!(c.cost(MachineKind::AdvancedAssembler), 3000);
    }

    #[test]
    fn advanced_assembler_needs_two_inputs() {
        let c = Catalog::standard();
        let spec = c.spec(MachineKind::AdvancedAssembler);
        assert_eq!(spec.inputs, vec![Resource::Gear, Resource::CopperWire]);
        assert_eq!(spec.outputs, vec![Resource::ComputeCore]);
    }

    #[test]
    fn sink_has_no_outputs_and_extractor_no_inputs() {
        let c = Catalog::standard();
        assert!(c.spec(MachineKind::Sink).outputs.is_empty());
        assert!(c.spec(MachineKind::Extractor).inputs.is_empty());
    }

    #[test]
    fn mutate_applies_valid_edits() {
        let mut c = Catalog::standard();
        c.mutate(MachineKind::Smelter, |s| s.speed = f64_to_fixed64(0.5))
            .unwrap();
        assert_eq!(c.spec(MachineKind::Smelter).speed, f64_to_fixed64(0.5));
    }

    #[test]
    fn mutate_rejects_negative_cost_and_keeps_old_spec() {
        let mut c = Catalog::standard();
        let err = c.mutate(MachineKind::Smelter, |s| s.cost = -1).unwrap_err();
        assert_eq!(
            err,
            CatalogError::NegativeCost {
                kind: MachineKind::Smelter,
                cost: -1
            }
        );
        assert_eq!(c.cost(MachineKind::Smelter), 500);
    }

    #[test]
    fn duplicate_inputs_rejected() {
        let mut c = Catalog::standard();
        let err = c
            .mutate(MachineKind::Assembler, |s| {
                s.inputs = vec![Resource::IronPlate, Resource::IronPlate]
            })
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateResource { .. }));
    }

    #[test]
    fn check_accepts_standard_and_rejects_short_tables() {
        assert_eq!(Catalog::standard().check(), Ok(()));

        let empty: Catalog = serde_json::from_str(r#"{"specs":[]}"#).unwrap();
        assert_eq!(empty.check(), Err(CatalogError::WrongSpecCount { found: 0 }));
    }

    #[test]
    fn check_validates_every_decoded_spec() {
        let mut json = serde_json::to_value(Catalog::standard()).unwrap();
        json["specs"][2]["cost"] = serde_json::json!(-10);
        let decoded: Catalog = serde_json::from_value(json).unwrap();
        assert_eq!(
            decoded.check(),
            Err(CatalogError::NegativeCost {
                kind: MachineKind::Assembler,
                cost: -10
            })
        );
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in MachineKind::ALL {
            assert_eq!(MachineKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(MachineKind::from_name("reactor"), None);
    }

    #[test]
    fn kind_serde_uses_reference_names() {
        let json = serde_json::to_string(&MachineKind::CopperExtractor).unwrap();
        assert_eq!(json, "\"extractor_copper\"");
    }
}
