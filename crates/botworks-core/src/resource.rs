use serde::{Deserialize, Serialize};
use std::fmt;

/// A transportable resource. Closed set; every inventory has a slot for each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    IronOre,
    IronPlate,
    Gear,
    CopperOre,
    CopperWire,
    ComputeCore,
}

impl Resource {
    pub const COUNT: usize = 6;

    pub const ALL: [Resource; Resource::COUNT] = [
        Resource::IronOre,
        Resource::IronPlate,
        Resource::Gear,
        Resource::CopperOre,
        Resource::CopperWire,
        Resource::ComputeCore,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Resource::IronOre => "iron_ore",
            Resource::IronPlate => "iron_plate",
            Resource::Gear => "gear",
            Resource::CopperOre => "copper_ore",
            Resource::CopperWire => "copper_wire",
            Resource::ComputeCore => "compute_core",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-resource counts for a machine.
///
/// A fixed array indexed by [`Resource`]; a resource that was never stocked
/// reads as zero, the same as one that ran out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Inventory {
    counts: [u32; Resource::COUNT],
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an inventory from `(resource, quantity)` pairs. Repeated
    /// resources accumulate.
    pub fn with_stock(stock: impl IntoIterator<Item = (Resource, u32)>) -> Self {
        let mut inv = Self::new();
        for (resource, quantity) in stock {
            inv.add(resource, quantity);
        }
        inv
    }

    #[inline]
    pub fn quantity(&self, resource: Resource) -> u32 {
        self.counts[resource.index()]
    }

    pub fn set(&mut self, resource: Resource, quantity: u32) {
        self.counts[resource.index()] = quantity;
    }

    pub fn add(&mut self, resource: Resource, quantity: u32) {
        let slot = &mut self.counts[resource.index()];
        *slot = slot.saturating_add(quantity);
    }

    /// Remove up to `quantity` units. Returns the amount actually removed.
    #[must_use = "returns the quantity actually removed, which may be less than requested"]
    pub fn remove(&mut self, resource: Resource, quantity: u32) -> u32 {
        let slot = &mut self.counts[resource.index()];
        let taken = quantity.min(*slot);
        *slot -= taken;
        taken
    }

    /// Take a single unit if one is present.
    pub fn take_one(&mut self, resource: Resource) -> bool {
        self.remove(resource, 1) == 1
    }

    /// Total units across all resources.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// Non-zero entries in resource declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Resource, u32)> + '_ {
        Resource::ALL
            .iter()
            .map(|&r| (r, self.quantity(r)))
            .filter(|&(_, q)| q > 0)
    }
}
