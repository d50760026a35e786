//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::catalog::MachineKind;
use crate::command::{self, Command, Outcome, StepContext};
use crate::engine::Engine;
use crate::fixed::{Fixed64, fixed_int};
use crate::id::MachineId;
use crate::machine::MachineBlueprint;
use crate::resource::Resource;
use crate::rng::SimRng;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

pub fn tick_cmd(delta: f64) -> Command {
    Command::Tick {
        delta: fixed(delta),
    }
}

// ===========================================================================
// Placement
// ===========================================================================

/// Place a machine for free and return its id.
pub fn place(engine: &mut Engine, blueprint: MachineBlueprint) -> MachineId {
    match command::add_machine(&mut engine.state, &engine.catalog, &blueprint, 0) {
        Outcome::MachinePlaced(id) => id,
        other => panic!("placement failed: {other:?}"),
    }
}

pub fn place_at(engine: &mut Engine, kind: MachineKind, x: i32, y: i32) -> MachineId {
    place(engine, MachineBlueprint::new(kind, fixed_int(x), fixed_int(y)))
}

/// Spawn `count` bots from a generator seeded with `seed`.
pub fn spawn(engine: &mut Engine, count: u32, seed: u64) {
    let mut rng = SimRng::new(seed);
    let mut ctx = StepContext::new(&mut rng, 0);
    engine.apply(&Command::SpawnBots { count }, &mut ctx);
}

// ===========================================================================
// Fixtures
// ===========================================================================

/// The reference demo layout: one iron chain ending in a sink, with boosted
/// speeds, and 100 bots.
pub fn demo_engine(seed: u64) -> Engine {
    let mut engine = Engine::standard();
    for (kind, speed, x) in [
        (MachineKind::Extractor, 0.1, 100),
        (MachineKind::Smelter, 0.05, 300),
        (MachineKind::Assembler, 0.03, 500),
        (MachineKind::Sink, 1.0, 700),
    ] {
        place(
            &mut engine,
            MachineBlueprint::new(kind, fixed_int(x), fixed_int(300)).with_speed(fixed(speed)),
        );
    }
    spawn(&mut engine, 100, seed);
    engine
}

/// `chains` copies of the full iron chain stacked vertically, each machine
/// pre-stocked so every stage is busy from the first tick, plus `bots` bots.
pub fn busy_engine(chains: u32, bots: u32, seed: u64) -> Engine {
    let mut engine = Engine::standard();
    for c in 0..chains as i32 {
        let y = 20 + c * 12;
        place(
            &mut engine,
            MachineBlueprint::new(MachineKind::Extractor, fixed_int(100), fixed_int(y))
                .with_speed(fixed_int(5))
                .with_stock(Resource::IronOre, 20),
        );
        place(
            &mut engine,
            MachineBlueprint::new(MachineKind::Smelter, fixed_int(300), fixed_int(y))
                .with_speed(fixed_int(3))
                .with_stock(Resource::IronOre, 5)
                .with_stock(Resource::IronPlate, 20),
        );
        place(
            &mut engine,
            MachineBlueprint::new(MachineKind::Assembler, fixed_int(500), fixed_int(y))
                .with_speed(fixed_int(2))
                .with_stock(Resource::IronPlate, 5)
                .with_stock(Resource::Gear, 20),
        );
        place(
            &mut engine,
            MachineBlueprint::new(MachineKind::Sink, fixed_int(700), fixed_int(y))
                .with_stock(Resource::Gear, 5),
        );
    }
    spawn(&mut engine, bots, seed);
    engine
}

// ===========================================================================
// Running
// ===========================================================================

/// Run `n` ticks of delta 1.
pub fn run_ticks(engine: &mut Engine, n: u64) {
    for _ in 0..n {
        engine.tick(fixed_int(1));
    }
}

/// Units of every resource across inventories and payloads, indexed by
/// [`Resource::index`].
pub fn resource_totals(engine: &Engine) -> [u64; Resource::COUNT] {
    let mut totals = [0u64; Resource::COUNT];
    for r in Resource::ALL {
        totals[r.index()] = engine.state.resource_total(r);
    }
    totals
}
