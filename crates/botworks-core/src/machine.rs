use crate::catalog::{MachineKind, MachineSpec};
use crate::fixed::{Fixed64, Ticks, fixed_int};
use crate::id::MachineId;
use crate::resource::{Inventory, Resource};
use serde::{Deserialize, Serialize};

/// Progress needed to complete one production cycle.
pub const CYCLE_PROGRESS: Fixed64 = fixed_int(100);

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

/// A stationary production unit.
///
/// The recipe (`inputs`, `outputs`, `speed`) is copied from the catalog at
/// creation time and never re-read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub id: MachineId,
    pub x: Fixed64,
    pub y: Fixed64,
    pub kind: MachineKind,
    pub inputs: Vec<Resource>,
    pub outputs: Vec<Resource>,
    pub speed: Fixed64,
    pub inventory: Inventory,
    /// Partial progress toward the next cycle, always in `[0, 100)`.
    pub progress: Fixed64,
    /// Caller-supplied timestamp of the command that created this machine.
    pub placed_at: Ticks,
}

/// Everything needed to place a machine without paying for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineBlueprint {
    pub kind: MachineKind,
    pub x: Fixed64,
    pub y: Fixed64,
    /// Overrides the catalog speed when set.
    pub speed: Option<Fixed64>,
    /// Initial stock.
    pub inventory: Inventory,
}

impl MachineBlueprint {
    pub fn new(kind: MachineKind, x: Fixed64, y: Fixed64) -> Self {
        Self {
            kind,
            x,
            y,
            speed: None,
            inventory: Inventory::new(),
        }
    }

    pub fn with_speed(mut self, speed: Fixed64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_stock(mut self, resource: Resource, quantity: u32) -> Self {
        self.inventory.add(resource, quantity);
        self
    }
}

impl Machine {
    /// Create an empty machine at rest from a catalog spec.
    pub fn from_spec(
        id: MachineId,
        kind: MachineKind,
        spec: &MachineSpec,
        x: Fixed64,
        y: Fixed64,
        placed_at: Ticks,
    ) -> Self {
        Self {
            id,
            x,
            y,
            kind,
            inputs: spec.inputs.clone(),
            outputs: spec.outputs.clone(),
            speed: spec.speed,
            inventory: Inventory::new(),
            progress: Fixed64::ZERO,
            placed_at,
        }
    }

    /// Machines with no outputs turn their cycles into credits.
    pub fn is_sink(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Whether the machine may accumulate progress this tick: every input
    /// has at least one unit on hand. A machine with neither inputs nor
    /// outputs never runs.
    pub fn can_process(&self) -> bool {
        if self.inputs.is_empty() && self.outputs.is_empty() {
            return false;
        }
        self.inputs.iter().all(|&r| self.inventory.quantity(r) > 0)
    }

    /// The most cycles current stock can pay for. Unbounded for machines
    /// without inputs.
    pub fn affordable_cycles(&self) -> u64 {
        self.inputs
            .iter()
            .map(|&r| self.inventory.quantity(r) as u64)
            .min()
            .unwrap_or(u64::MAX)
    }

    /// Advance production by `delta` units of simulated time and commit any
    /// completed cycles to the inventory. Returns the number of cycles
    /// realized.
    ///
    /// Every full [`CYCLE_PROGRESS`] completes one cycle. The count is
    /// capped by [`affordable_cycles`](Self::affordable_cycles); when the
    /// cap bites, leftover progress is dropped instead of carried forward.
    pub fn produce(&mut self, delta: Fixed64) -> u32 {
        if !self.can_process() {
            return 0;
        }

        let progress = self
            .progress
            .saturating_add(self.speed.saturating_mul(delta.max(Fixed64::ZERO)));
        let remainder = progress % CYCLE_PROGRESS;
        let completed: u64 = ((progress - remainder) / CYCLE_PROGRESS).to_num();

        let afford = self.affordable_cycles();
        let cycles = if completed > afford {
            self.progress = Fixed64::ZERO;
            afford
        } else {
            self.progress = remainder;
            completed
        };
        let cycles = cycles.min(u32::MAX as u64) as u32;

        if cycles > 0 {
            for &r in &self.inputs {
                let _ = self.inventory.remove(r, cycles);
            }
            for &r in &self.outputs {
                self.inventory.add(r, cycles);
            }
        }
        cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::fixed::f64_to_fixed64;

    fn machine(kind: MachineKind) -> Machine {
        let catalog = Catalog::standard();
        Machine::from_spec(
            MachineId(0),
            kind,
            catalog.spec(kind),
            Fixed64::ZERO,
            Fixed64::ZERO,
            0,
        )
    }

    #[test]
    fn extractor_runs_without_inputs() {
        let mut m = machine(MachineKind::Extractor);
        m.speed = fixed_int(50);
        assert!(m.can_process());
        assert_eq!(m.produce(fixed_int(1)), 0);
        assert_eq!(m.progress, fixed_int(50));
        assert_eq!(m.produce(fixed_int(1)), 1);
        assert_eq!(m.progress, Fixed64::ZERO);
        assert_eq!(m.inventory.quantity(Resource::IronOre), 1);
    }

    #[test]
    fn several_cycles_in_one_tick() {
        let mut m = machine(MachineKind::Extractor);
        m.speed = fixed_int(1);
        assert_eq!(m.produce(fixed_int(350)), 3);
        assert_eq!(m.progress, fixed_int(50));
        assert_eq!(m.inventory.quantity(Resource::IronOre), 3);
    }

    #[test]
    fn smelter_stalls_without_ore() {
        let mut m = machine(MachineKind::Smelter);
        assert!(!m.can_process());
        assert_eq!(m.produce(fixed_int(10_000)), 0);
        assert_eq!(m.progress, Fixed64::ZERO);
    }

    #[test]
    fn large_delta_is_capped_by_stock() {
        let mut m = machine(MachineKind::Smelter);
        m.speed = fixed_int(1);
        m.inventory.set(Resource::IronOre, 2);
        // 5 cycles worth of progress but only 2 ore.
        assert_eq!(m.produce(fixed_int(550)), 2);
        assert_eq!(m.progress, Fixed64::ZERO);
        assert_eq!(m.inventory.quantity(Resource::IronOre), 0);
        assert_eq!(m.inventory.quantity(Resource::IronPlate), 2);
    }

    #[test]
    fn cap_uses_scarcest_input() {
        let mut m = machine(MachineKind::AdvancedAssembler);
        m.speed = fixed_int(1);
        m.inventory.set(Resource::Gear, 4);
        m.inventory.set(Resource::CopperWire, 1);
        assert_eq!(m.produce(fixed_int(300)), 1);
        assert_eq!(m.inventory.quantity(Resource::Gear), 3);
        assert_eq!(m.inventory.quantity(Resource::CopperWire), 0);
        assert_eq!(m.inventory.quantity(Resource::ComputeCore), 1);
    }

    #[test]
    fn sink_consumes_without_output() {
        let mut m = machine(MachineKind::Sink);
        m.inventory.set(Resource::Gear, 1);
        assert!(m.is_sink());
        assert_eq!(m.produce(fixed_int(100)), 1);
        assert!(m.inventory.is_empty());
    }

    #[test]
    fn inert_machine_never_runs() {
        let mut m = machine(MachineKind::Extractor);
        m.outputs.clear();
        assert!(!m.can_process());
        assert_eq!(m.produce(fixed_int(1_000)), 0);
    }

    #[test]
    fn progress_stays_below_a_cycle() {
        let mut m = machine(MachineKind::Extractor);
        m.speed = f64_to_fixed64(0.7);
        for _ in 0..500 {
            m.produce(f64_to_fixed64(3.3));
            assert!(m.progress >= Fixed64::ZERO && m.progress < CYCLE_PROGRESS);
        }
    }

    #[test]
    fn negative_delta_is_ignored() {
        let mut m = machine(MachineKind::Extractor);
        m.progress = fixed_int(10);
        assert_eq!(m.produce(fixed_int(-5)), 0);
        assert_eq!(m.progress, fixed_int(10));
    }

    #[test]
    fn blueprint_builder() {
        let bp = MachineBlueprint::new(MachineKind::Smelter, fixed_int(1), fixed_int(2))
            .with_speed(fixed_int(3))
            .with_stock(Resource::IronOre, 4);
        assert_eq!(bp.speed, Some(fixed_int(3)));
        assert_eq!(bp.inventory.quantity(Resource::IronOre), 4);
    }
}
