//! Per-tick supply and demand signals.
//!
//! Both lists are rebuilt once per tick from post-production inventories
//! and shared by every bot evaluated in that tick. Neither list is updated
//! as bots claim entries, so several bots can chase the same unit; the
//! losers find the shelf empty on arrival and go back to idle.

use crate::id::MachineId;
use crate::machine::Machine;
use crate::resource::Resource;

/// One entry in the supply or demand list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub machine: MachineId,
    pub resource: Resource,
    pub quantity: u32,
}

/// Supply (fullest first) and demand (most starved first) for one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signals {
    pub supply: Vec<Signal>,
    pub demand: Vec<Signal>,
}

impl Signals {
    /// Build the lists from the given machines.
    ///
    /// Supply holds every stocked output; demand holds every input below
    /// `low_water_mark`. Equal quantities are ordered by machine id, then
    /// by resource declaration order, whatever order the recipe lists them
    /// in or the machines arrive in.
    pub fn collect<'a>(machines: impl IntoIterator<Item = &'a Machine>, low_water_mark: u32) -> Self {
        let mut supply = Vec::new();
        let mut demand = Vec::new();

        for m in machines {
            for &r in &m.outputs {
                let quantity = m.inventory.quantity(r);
                if quantity > 0 {
                    supply.push(Signal {
                        machine: m.id,
                        resource: r,
                        quantity,
                    });
                }
            }
            for &r in &m.inputs {
                let quantity = m.inventory.quantity(r);
                if quantity < low_water_mark {
                    demand.push(Signal {
                        machine: m.id,
                        resource: r,
                        quantity,
                    });
                }
            }
        }

        demand.sort_by_key(|s| (s.quantity, s.machine, s.resource));
        supply.sort_by(|a, b| {
            b.quantity
                .cmp(&a.quantity)
                .then(a.machine.cmp(&b.machine))
                .then(a.resource.cmp(&b.resource))
        });

        Self { supply, demand }
    }

    /// The most starved consumer of `resource`, if any.
    pub fn first_demand_for(&self, resource: Resource) -> Option<&Signal> {
        self.demand.iter().find(|s| s.resource == resource)
    }

    /// The fullest producer, whatever it makes.
    pub fn first_supply(&self) -> Option<&Signal> {
        self.supply.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, MachineKind};
    use crate::fixed::Fixed64;

    fn machine(id: u64, kind: MachineKind, stock: &[(Resource, u32)]) -> Machine {
        let catalog = Catalog::standard();
        let mut m = Machine::from_spec(
            MachineId(id),
            kind,
            catalog.spec(kind),
            Fixed64::ZERO,
            Fixed64::ZERO,
            0,
        );
        for &(r, q) in stock {
            m.inventory.set(r, q);
        }
        m
    }

    #[test]
    fn most_starved_demand_comes_first() {
        let machines = [
            machine(0, MachineKind::Smelter, &[(Resource::IronOre, 5)]),
            machine(1, MachineKind::Smelter, &[(Resource::IronOre, 1)]),
        ];
        let signals = Signals::collect(&machines, 10);
        assert_eq!(signals.demand[0].machine, MachineId(1));
        assert_eq!(signals.demand[0].quantity, 1);
        assert_eq!(signals.demand[1].machine, MachineId(0));
    }

    #[test]
    fn fullest_supply_comes_first() {
        let machines = [
            machine(0, MachineKind::Extractor, &[(Resource::IronOre, 2)]),
            machine(1, MachineKind::CopperExtractor, &[(Resource::CopperOre, 9)]),
        ];
        let signals = Signals::collect(&machines, 10);
        let first = signals.first_supply().unwrap();
        assert_eq!(first.machine, MachineId(1));
        assert_eq!(first.resource, Resource::CopperOre);
    }

    #[test]
    fn ties_keep_machine_order() {
        let machines = [
            machine(3, MachineKind::Smelter, &[]),
            machine(4, MachineKind::Smelter, &[]),
            machine(5, MachineKind::Smelter, &[]),
        ];
        let signals = Signals::collect(&machines, 10);
        let ids: Vec<_> = signals.demand.iter().map(|s| s.machine.0).collect();
        assert_eq!(ids, vec![3, 4, 5]);
    }

    #[test]
    fn ties_within_a_machine_follow_resource_order() {
        let mut m = machine(0, MachineKind::AdvancedAssembler, &[]);
        m.inputs = vec![Resource::CopperWire, Resource::Gear];
        m.outputs = vec![Resource::ComputeCore, Resource::IronPlate];
        m.inventory.set(Resource::ComputeCore, 4);
        m.inventory.set(Resource::IronPlate, 4);

        let signals = Signals::collect([&m], 10);
        let demand: Vec<_> = signals.demand.iter().map(|s| s.resource).collect();
        assert_eq!(demand, vec![Resource::Gear, Resource::CopperWire]);
        let supply: Vec<_> = signals.supply.iter().map(|s| s.resource).collect();
        assert_eq!(supply, vec![Resource::IronPlate, Resource::ComputeCore]);
    }

    #[test]
    fn machine_order_does_not_matter() {
        let machines = [
            machine(9, MachineKind::Smelter, &[(Resource::IronOre, 2)]),
            machine(2, MachineKind::Smelter, &[(Resource::IronOre, 2)]),
        ];
        let signals = Signals::collect(&machines, 10);
        let ids: Vec<_> = signals.demand.iter().map(|s| s.machine.0).collect();
        assert_eq!(ids, vec![2, 9]);
    }

    #[test]
    fn stocked_inputs_are_not_demand() {
        let machines = [machine(0, MachineKind::Smelter, &[(Resource::IronOre, 10)])];
        let signals = Signals::collect(&machines, 10);
        assert!(signals.demand.is_empty());
    }

    #[test]
    fn empty_outputs_are_not_supply() {
        let machines = [machine(0, MachineKind::Extractor, &[])];
        let signals = Signals::collect(&machines, 10);
        assert!(signals.supply.is_empty());
        assert!(signals.first_supply().is_none());
    }

    #[test]
    fn demand_lookup_filters_by_resource() {
        let machines = [
            machine(0, MachineKind::Smelter, &[]),
            machine(1, MachineKind::Assembler, &[(Resource::IronPlate, 3)]),
        ];
        let signals = Signals::collect(&machines, 10);
        let plate = signals.first_demand_for(Resource::IronPlate).unwrap();
        assert_eq!(plate.machine, MachineId(1));
        assert!(signals.first_demand_for(Resource::Gear).is_none());
    }

    #[test]
    fn advanced_assembler_reports_each_missing_input() {
        let machines = [machine(
            0,
            MachineKind::AdvancedAssembler,
            &[(Resource::Gear, 12)],
        )];
        let signals = Signals::collect(&machines, 10);
        assert_eq!(signals.demand.len(), 1);
        assert_eq!(signals.demand[0].resource, Resource::CopperWire);
    }
}
