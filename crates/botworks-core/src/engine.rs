//! The simulation engine: owns the factory state and runs the tick
//! pipeline.
//!
//! # Architecture
//!
//! The `Engine` owns:
//! - A [`Catalog`] consulted when machines are bought or added
//! - A [`SimConfig`] with the balance constants
//! - A [`FactoryState`] (machines, bots, ledger, tick counter, time scale)
//!
//! # Tick pipeline
//!
//! Each [`Engine::tick`] runs:
//! 1. **Production** -- every machine advances its progress and commits the
//!    cycles it completed. Order-independent across machines.
//! 2. **Logistics** -- supply and demand lists are built from the
//!    post-production inventories, then bots advance in ascending id order,
//!    claiming work, moving, and transferring single units.
//! 3. **Bookkeeping** -- increment the tick counter.
//!
//! A tick whose effective delta is zero skips phases 1 and 2.

use std::collections::BTreeMap;

use tracing::{debug, trace, warn};

use crate::bot::{Bot, BotTask, move_towards};
use crate::catalog::Catalog;
use crate::command::{self, Command, Outcome, StepContext};
use crate::config::SimConfig;
use crate::fixed::Fixed64;
use crate::id::MachineId;
use crate::logistics::Signals;
use crate::machine::Machine;
use crate::sim;
use crate::state::FactoryState;

// ---------------------------------------------------------------------------
// Tick report
// ---------------------------------------------------------------------------

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick count after this tick.
    pub tick: u64,
    /// `delta * time_scale`, clamped at zero.
    pub effective_delta: Fixed64,
    /// Production cycles completed across all machines.
    pub cycles_completed: u64,
    /// Credits paid out by machines without outputs.
    pub credits_earned: i64,
    /// Idle bots that picked up a new task.
    pub assignments: u32,
    /// Units lifted out of a machine inventory.
    pub pickups: u32,
    /// Bots that arrived for a pickup and found nothing left.
    pub contested_pickups: u32,
    /// Units handed into a machine inventory.
    pub deliveries: u32,
    /// Bots whose target machine no longer exists.
    pub stranded: u32,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Engine {
    pub catalog: Catalog,
    pub config: SimConfig,
    pub state: FactoryState,
}

impl Engine {
    /// Create an empty factory holding `config.starting_credits`.
    pub fn new(catalog: Catalog, config: SimConfig) -> Self {
        let state = FactoryState::new(config.starting_credits);
        Self {
            catalog,
            config,
            state,
        }
    }

    /// Standard catalog, default config, empty factory.
    pub fn standard() -> Self {
        Self::new(Catalog::standard(), SimConfig::default())
    }

    /// Assemble an engine around an existing state.
    pub fn from_parts(catalog: Catalog, config: SimConfig, state: FactoryState) -> Self {
        Self {
            catalog,
            config,
            state,
        }
    }

    // -----------------------------------------------------------------------
    // Transition function
    // -----------------------------------------------------------------------

    /// Apply one command. This is the only way external intents reach the
    /// state, and it never fails: invalid commands come back as
    /// [`Outcome::Rejected`] with the state unchanged.
    pub fn apply(&mut self, command: &Command, ctx: &mut StepContext<'_>) -> Outcome {
        let outcome = match command {
            Command::Tick { delta } => Outcome::Ticked(self.tick(*delta)),
            Command::SpawnBots { count } => {
                command::spawn_bots(&mut self.state, &self.config, *count, ctx.rng)
            }
            Command::AddMachine { blueprint } => {
                command::add_machine(&mut self.state, &self.catalog, blueprint, ctx.now)
            }
            Command::BuyMachine { kind, x, y } => {
                command::buy_machine(&mut self.state, &self.catalog, *kind, *x, *y, ctx.now)
            }
            Command::MarketCrash => command::market_crash(&mut self.state),
            Command::ResetBot { bot } => command::reset_bot(&mut self.state, *bot),
            Command::SetTimeScale { multiplier } => {
                command::set_time_scale(&mut self.state, *multiplier)
            }
            Command::SetAutopilotEnabled { enabled } => {
                command::set_autopilot_enabled(&mut self.state, *enabled)
            }
        };

        if let Outcome::Rejected(reason) = &outcome {
            debug!(
                command = command.name(),
                tick = self.state.tick,
                %reason,
                "command rejected"
            );
        }
        outcome
    }

    /// Advance the simulation by `delta` (scaled by the current time scale).
    ///
    /// Total: there is no error path. Negative deltas are treated as zero.
    pub fn tick(&mut self, delta: Fixed64) -> TickReport {
        let effective = delta
            .max(Fixed64::ZERO)
            .saturating_mul(self.state.time_scale);

        let mut report = TickReport {
            effective_delta: effective,
            ..TickReport::default()
        };

        if effective > Fixed64::ZERO {
            self.phase_production(effective, &mut report);
            self.phase_logistics(effective, &mut report);
        }
        self.phase_bookkeeping(&mut report);

        trace!(
            tick = report.tick,
            cycles = report.cycles_completed,
            earned = report.credits_earned,
            assignments = report.assignments,
            pickups = report.pickups,
            deliveries = report.deliveries,
            contested = report.contested_pickups,
            "tick"
        );
        report
    }

    // -----------------------------------------------------------------------
    // Phase 1: Production
    // -----------------------------------------------------------------------

    fn phase_production(&mut self, delta: Fixed64, report: &mut TickReport) {
        let (cycles, sink_cycles) = produce_all(&mut self.state.machines, delta);

        let earned = i64::try_from(sink_cycles)
            .unwrap_or(i64::MAX)
            .saturating_mul(self.config.sink_reward);
        self.state.credits = self.state.credits.saturating_add(earned);

        report.cycles_completed = cycles;
        report.credits_earned = earned;
    }

    // -----------------------------------------------------------------------
    // Phase 2: Logistics
    // -----------------------------------------------------------------------

    fn phase_logistics(&mut self, delta: Fixed64, report: &mut TickReport) {
        let signals = Signals::collect(self.state.machines.values(), self.config.low_water_mark);
        let step = self.config.bot_speed.saturating_mul(delta);

        let FactoryState { machines, bots, .. } = &mut self.state;
        for bot in bots.values_mut() {
            advance_bot(bot, machines, &signals, step, report);
        }
    }

    // -----------------------------------------------------------------------
    // Phase 3: Bookkeeping
    // -----------------------------------------------------------------------

    fn phase_bookkeeping(&mut self, report: &mut TickReport) {
        self.state.tick += 1;
        report.tick = self.state.tick;
    }

    // -----------------------------------------------------------------------
    // State hash
    // -----------------------------------------------------------------------

    /// Deterministic hash of the whole factory state.
    pub fn state_hash(&self) -> u64 {
        sim::hash_state(&self.state)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::standard()
    }
}

/// Run production on every machine. Returns `(all cycles, sink cycles)`.
#[cfg(not(feature = "parallel"))]
fn produce_all(machines: &mut BTreeMap<MachineId, Machine>, delta: Fixed64) -> (u64, u64) {
    let mut cycles = 0u64;
    let mut sink_cycles = 0u64;
    for machine in machines.values_mut() {
        let done = machine.produce(delta) as u64;
        cycles += done;
        if machine.is_sink() {
            sink_cycles += done;
        }
    }
    (cycles, sink_cycles)
}

/// Run production on every machine. Returns `(all cycles, sink cycles)`.
///
/// Machines never read each other during production, so the result is
/// identical to the sequential version.
#[cfg(feature = "parallel")]
fn produce_all(machines: &mut BTreeMap<MachineId, Machine>, delta: Fixed64) -> (u64, u64) {
    use rayon::prelude::*;

    machines
        .par_iter_mut()
        .map(|(_, machine)| {
            let done = machine.produce(delta) as u64;
            (done, if machine.is_sink() { done } else { 0 })
        })
        .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1))
}

/// One bot's turn in the logistics phase.
fn advance_bot(
    bot: &mut Bot,
    machines: &mut BTreeMap<MachineId, Machine>,
    signals: &Signals,
    step: Fixed64,
    report: &mut TickReport,
) {
    match bot.task {
        BotTask::Idle => {
            let task = match bot.payload {
                Some(carried) => signals
                    .first_demand_for(carried)
                    .map(|d| BotTask::MovingToDeliver {
                        machine: d.machine,
                        resource: carried,
                    }),
                None => signals.first_supply().map(|s| BotTask::MovingToPickup {
                    machine: s.machine,
                    resource: s.resource,
                }),
            };
            if let Some(task) = task {
                bot.task = task;
                report.assignments += 1;
            }
        }

        BotTask::MovingToPickup { machine, resource } => {
            let Some(target) = machines.get_mut(&machine) else {
                bot.task = BotTask::Idle;
                report.stranded += 1;
                return;
            };

            let mv = move_towards(bot.x, bot.y, target.x, target.y, step);
            bot.x = mv.x;
            bot.y = mv.y;
            if mv.arrived {
                if bot.payload.is_none() && target.inventory.take_one(resource) {
                    bot.payload = Some(resource);
                    report.pickups += 1;
                } else {
                    report.contested_pickups += 1;
                }
                bot.task = BotTask::Idle;
            }
        }

        BotTask::MovingToDeliver { machine, resource } => {
            let Some(target) = machines.get_mut(&machine) else {
                warn!(
                    bot = %bot.id,
                    %machine,
                    %resource,
                    "delivery target vanished, bot keeps its payload"
                );
                bot.task = BotTask::Idle;
                report.stranded += 1;
                return;
            };

            let mv = move_towards(bot.x, bot.y, target.x, target.y, step);
            bot.x = mv.x;
            bot.y = mv.y;
            if mv.arrived {
                if bot.payload == Some(resource) {
                    target.inventory.add(resource, 1);
                    bot.payload = None;
                    report.deliveries += 1;
                }
                bot.task = BotTask::Idle;
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MachineKind;
    use crate::fixed::{f64_to_fixed64, fixed_int};
    use crate::id::BotId;
    use crate::machine::MachineBlueprint;
    use crate::resource::Resource;
    use crate::rng::SimRng;

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn add(engine: &mut Engine, bp: MachineBlueprint) -> MachineId {
        let mut rng = SimRng::new(0);
        let mut ctx = StepContext::new(&mut rng, 0);
        match engine.apply(&Command::AddMachine { blueprint: bp }, &mut ctx) {
            Outcome::MachinePlaced(id) => id,
            other => panic!("expected placement, got {other:?}"),
        }
    }

    fn at(kind: MachineKind, x: i32, y: i32) -> MachineBlueprint {
        MachineBlueprint::new(kind, fixed_int(x), fixed_int(y))
    }

    fn bot_at(engine: &mut Engine, x: i32, y: i32) -> BotId {
        engine.state.spawn_bot_at(fixed_int(x), fixed_int(y))
    }

    // -----------------------------------------------------------------------
    // Production
    // -----------------------------------------------------------------------

    #[test]
    fn tick_increments_counter_even_with_zero_delta() {
        let mut engine = Engine::standard();
        let report = engine.tick(Fixed64::ZERO);
        assert_eq!(report.tick, 1);
        assert_eq!(engine.state.tick, 1);
    }

    #[test]
    fn time_scale_multiplies_delta() {
        let mut engine = Engine::standard();
        let ext = add(
            &mut engine,
            at(MachineKind::Extractor, 0, 0).with_speed(fixed_int(10)),
        );
        engine.state.time_scale = fixed_int(5);
        let report = engine.tick(fixed_int(2));
        assert_eq!(report.effective_delta, fixed_int(10));
        assert_eq!(report.cycles_completed, 1);
        assert_eq!(
            engine.state.machines[&ext].inventory.quantity(Resource::IronOre),
            1
        );
    }

    #[test]
    fn sink_pays_per_cycle() {
        let mut engine = Engine::standard();
        add(
            &mut engine,
            at(MachineKind::Sink, 0, 0).with_stock(Resource::Gear, 5),
        );
        let before = engine.state.credits;
        let report = engine.tick(fixed_int(300));
        assert_eq!(report.cycles_completed, 3);
        assert_eq!(report.credits_earned, 150);
        assert_eq!(engine.state.credits, before + 150);
    }

    #[test]
    fn negative_delta_behaves_like_zero() {
        let mut engine = Engine::standard();
        add(&mut engine, at(MachineKind::Extractor, 0, 0));
        let before = engine.state.clone();
        engine.tick(fixed_int(-10));
        assert_eq!(engine.state.machines, before.machines);
        assert_eq!(engine.state.tick, before.tick + 1);
    }

    // -----------------------------------------------------------------------
    // Logistics
    // -----------------------------------------------------------------------

    #[test]
    fn idle_bot_claims_fullest_supply() {
        let mut engine = Engine::standard();
        add(
            &mut engine,
            at(MachineKind::Extractor, 100, 0).with_stock(Resource::IronOre, 1),
        );
        let rich = add(
            &mut engine,
            at(MachineKind::CopperExtractor, 200, 0).with_stock(Resource::CopperOre, 4),
        );
        let bot = bot_at(&mut engine, 0, 0);

        let report = engine.tick(fixed_int(1));
        assert_eq!(report.assignments, 1);
        assert_eq!(
            engine.state.bots[&bot].task,
            BotTask::MovingToPickup {
                machine: rich,
                resource: Resource::CopperOre
            }
        );
        // Assignment and movement never happen in the same tick.
        assert_eq!(engine.state.bots[&bot].x, Fixed64::ZERO);
    }

    #[test]
    fn full_pickup_and_delivery_cycle() {
        let mut engine = Engine::standard();
        let ext = add(
            &mut engine,
            at(MachineKind::Extractor, 10, 0).with_stock(Resource::IronOre, 3),
        );
        let smelter = add(&mut engine, at(MachineKind::Smelter, 20, 0));
        let bot = bot_at(&mut engine, 0, 0);

        // Assign, then travel 10 units at 5 per tick: arrival needs the
        // remaining distance to drop below the step.
        engine.tick(fixed_int(1));
        for _ in 0..3 {
            engine.tick(fixed_int(1));
        }
        assert_eq!(engine.state.bots[&bot].payload, Some(Resource::IronOre));
        assert!(engine.state.bots[&bot].is_idle());

        // Assign delivery, then travel to the smelter.
        engine.tick(fixed_int(1));
        assert_eq!(
            engine.state.bots[&bot].task,
            BotTask::MovingToDeliver {
                machine: smelter,
                resource: Resource::IronOre
            }
        );
        for _ in 0..3 {
            engine.tick(fixed_int(1));
        }
        assert_eq!(engine.state.bots[&bot].payload, None);
        assert!(
            engine.state.machines[&smelter]
                .inventory
                .quantity(Resource::IronOre)
                >= 1
        );
        assert!(engine.state.machines[&ext].inventory.quantity(Resource::IronOre) <= 2);
    }

    #[test]
    fn contested_pickup_loser_goes_idle_empty() {
        let mut engine = Engine::standard();
        let ext = add(
            &mut engine,
            at(MachineKind::Extractor, 3, 0)
                .with_speed(Fixed64::ZERO)
                .with_stock(Resource::IronOre, 1),
        );
        let first = bot_at(&mut engine, 0, 0);
        let second = bot_at(&mut engine, 0, 0);

        engine.tick(fixed_int(1)); // both assigned to the single unit
        let report = engine.tick(fixed_int(1)); // both arrive
        assert_eq!(report.pickups, 1);
        assert_eq!(report.contested_pickups, 1);
        assert_eq!(engine.state.bots[&first].payload, Some(Resource::IronOre));
        assert_eq!(engine.state.bots[&second].payload, None);
        assert!(engine.state.bots[&second].is_idle());
        assert_eq!(
            engine.state.machines[&ext].inventory.quantity(Resource::IronOre),
            0
        );
    }

    #[test]
    fn carrying_bot_without_demand_stays_idle() {
        let mut engine = Engine::standard();
        add(
            &mut engine,
            at(MachineKind::Smelter, 0, 0).with_stock(Resource::IronOre, 50),
        );
        let bot = bot_at(&mut engine, 0, 0);
        engine.state.bots.get_mut(&bot).unwrap().payload = Some(Resource::IronOre);
        engine.tick(f64_to_fixed64(0.001));
        assert!(engine.state.bots[&bot].is_idle());
        assert_eq!(engine.state.bots[&bot].payload, Some(Resource::IronOre));
    }

    #[test]
    fn vanished_pickup_target_resets_bot() {
        let mut engine = Engine::standard();
        let bot = bot_at(&mut engine, 0, 0);
        engine.state.bots.get_mut(&bot).unwrap().task = BotTask::MovingToPickup {
            machine: MachineId(99),
            resource: Resource::Gear,
        };
        let report = engine.tick(fixed_int(1));
        assert_eq!(report.stranded, 1);
        assert!(engine.state.bots[&bot].is_idle());
        assert_eq!(engine.state.bots[&bot].x, Fixed64::ZERO);
    }

    #[test]
    fn vanished_delivery_target_keeps_payload() {
        let mut engine = Engine::standard();
        let bot = bot_at(&mut engine, 0, 0);
        {
            let b = engine.state.bots.get_mut(&bot).unwrap();
            b.payload = Some(Resource::Gear);
            b.task = BotTask::MovingToDeliver {
                machine: MachineId(42),
                resource: Resource::Gear,
            };
        }
        engine.tick(fixed_int(1));
        assert!(engine.state.bots[&bot].is_idle());
        assert_eq!(engine.state.bots[&bot].payload, Some(Resource::Gear));
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    #[test]
    fn apply_tick_reports() {
        let mut engine = Engine::standard();
        let mut rng = SimRng::new(1);
        let mut ctx = StepContext::new(&mut rng, 0);
        let outcome = engine.apply(
            &Command::Tick {
                delta: fixed_int(1),
            },
            &mut ctx,
        );
        assert!(matches!(outcome, Outcome::Ticked(TickReport { tick: 1, .. })));
    }

    #[test]
    fn apply_buy_uses_context_timestamp() {
        let mut engine = Engine::standard();
        let mut rng = SimRng::new(1);
        let mut ctx = StepContext::new(&mut rng, 1234);
        let outcome = engine.apply(
            &Command::BuyMachine {
                kind: MachineKind::Extractor,
                x: fixed_int(1),
                y: fixed_int(1),
            },
            &mut ctx,
        );
        let Outcome::MachinePlaced(id) = outcome else {
            panic!("expected placement, got {outcome:?}");
        };
        assert_eq!(engine.state.machines[&id].placed_at, 1234);
        assert_eq!(engine.state.credits, 900);
    }

    #[test]
    fn state_hash_tracks_changes() {
        let mut engine = Engine::standard();
        let h0 = engine.state_hash();
        assert_eq!(h0, Engine::standard().state_hash());
        engine.tick(fixed_int(1));
        assert_ne!(engine.state_hash(), h0);
    }
}
