//! Autopilot for the botworks factory simulation.
//!
//! A greedy planner that watches a [`FactorySummary`] and grows the factory
//! unattended: more bots when logistics is the bottleneck, more machines
//! when there is cash to spare. It never touches the engine directly;
//! every decision leaves as a [`Command`] pushed onto a [`CommandQueue`]
//! for the single writer to apply.
//!
//! # Priorities
//!
//! Each invocation emits at most one command, taking the first rule that
//! fires:
//!
//! 1. No bots at all: spawn a bootstrap batch.
//! 2. Fewer than `idle_percent` of bots idle and under `bot_cap`: spawn
//!    `max(min_batch, batch_percent of the population)`.
//! 3. Construction, keeping `cash_buffer` credits in reserve:
//!    balance the iron chain, then (once `copper_gate` assemblers exist)
//!    the copper chain, then advanced assemblers, and finally expand the
//!    iron chain while credits exceed `expansion_threshold`.
//!
//! The enabled flag lives in the factory state, so toggling it is itself a
//! replayable command and takes effect at the next invocation.

mod config;

pub use config::{AutopilotConfig, PlacementArea};

use botworks_core::catalog::{Catalog, MachineKind};
use botworks_core::command::{Command, CommandQueue};
use botworks_core::engine::Engine;
use botworks_core::query::FactorySummary;
use botworks_core::rng::SimRng;
use tracing::info;

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnReason {
    /// The factory has no bots at all.
    Bootstrap,
    /// Too few bots are idle to absorb new work.
    LowIdle { idle: usize, total: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildReason {
    IronChain,
    CopperChain,
    AdvancedAssembler,
    Expansion,
}

/// What the planner wants to happen next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    SpawnBots { count: u32, reason: SpawnReason },
    Build { kind: MachineKind, reason: BuildReason },
}

/// Machine kinds the planner buys. Sinks are never bought.
pub const BUILDABLE: [MachineKind; 6] = [
    MachineKind::Extractor,
    MachineKind::Smelter,
    MachineKind::Assembler,
    MachineKind::CopperExtractor,
    MachineKind::CopperSmelter,
    MachineKind::AdvancedAssembler,
];

/// Pick the next growth step for the factory described by `summary`.
///
/// Pure: the same summary, catalog, and config always give the same
/// answer. Ignores the enabled flag; see [`Autopilot::plan`].
pub fn decide(
    summary: &FactorySummary,
    catalog: &Catalog,
    config: &AutopilotConfig,
) -> Option<Decision> {
    if summary.bot_count == 0 {
        return Some(Decision::SpawnBots {
            count: config.bootstrap_batch,
            reason: SpawnReason::Bootstrap,
        });
    }
    if let Some(spawn) = manage_bots(summary, config) {
        return Some(spawn);
    }
    manage_construction(summary, catalog, config)
}

fn manage_bots(summary: &FactorySummary, config: &AutopilotConfig) -> Option<Decision> {
    let total = summary.bot_count as u64;
    let idle = summary.idle_bots as u64;

    // idle / total < idle_percent / 100
    let starved = idle * 100 < config.idle_percent as u64 * total;
    if !starved || summary.bot_count >= config.bot_cap {
        return None;
    }

    let scaled = (total * config.batch_percent as u64 / 100).min(u32::MAX as u64) as u32;
    Some(Decision::SpawnBots {
        count: scaled.max(config.min_batch),
        reason: SpawnReason::LowIdle {
            idle: summary.idle_bots,
            total: summary.bot_count,
        },
    })
}

fn manage_construction(
    summary: &FactorySummary,
    catalog: &Catalog,
    config: &AutopilotConfig,
) -> Option<Decision> {
    use MachineKind::*;

    let credits = summary.credits;
    let reserve = config.cash_buffer;
    let cheapest = BUILDABLE.iter().map(|&k| catalog.cost(k)).min()?;
    if credits < cheapest.saturating_add(reserve) {
        return None;
    }

    let affordable = |kind: MachineKind| credits > catalog.cost(kind).saturating_add(reserve);
    let n = |kind: MachineKind| summary.count(kind);
    let build = |kind, reason| Some(Decision::Build { kind, reason });

    if n(Extractor) < n(Smelter) && affordable(Extractor) {
        return build(Extractor, BuildReason::IronChain);
    }
    if n(Smelter) < n(Extractor) && affordable(Smelter) {
        return build(Smelter, BuildReason::IronChain);
    }
    if n(Assembler) < n(Smelter) && affordable(Assembler) {
        return build(Assembler, BuildReason::IronChain);
    }

    if n(Assembler) >= config.copper_gate {
        if n(CopperExtractor) < n(CopperSmelter) + 1 && affordable(CopperExtractor) {
            return build(CopperExtractor, BuildReason::CopperChain);
        }
        if n(CopperSmelter) < n(CopperExtractor) && affordable(CopperSmelter) {
            return build(CopperSmelter, BuildReason::CopperChain);
        }
    }

    if n(AdvancedAssembler) < n(Assembler).min(n(CopperSmelter)) && affordable(AdvancedAssembler) {
        return build(AdvancedAssembler, BuildReason::AdvancedAssembler);
    }

    if credits > config.expansion_threshold {
        let kind = if n(Extractor) <= n(Smelter) {
            Extractor
        } else if n(Smelter) <= n(Assembler) {
            Smelter
        } else {
            Assembler
        };
        if affordable(kind) {
            return build(kind, BuildReason::Expansion);
        }
    }

    None
}

// ---------------------------------------------------------------------------
// Autopilot
// ---------------------------------------------------------------------------

/// Stateful wrapper around [`decide`]: reads the enabled flag, draws
/// placements from its own generator, and keeps its cadence.
#[derive(Debug, Clone)]
pub struct Autopilot {
    config: AutopilotConfig,
    rng: SimRng,
    decisions: u64,
    last_run_ms: Option<u64>,
}

impl Autopilot {
    pub fn new(config: AutopilotConfig) -> Self {
        let rng = SimRng::new(config.seed);
        Self {
            config,
            rng,
            decisions: 0,
            last_run_ms: None,
        }
    }

    pub fn config(&self) -> &AutopilotConfig {
        &self.config
    }

    /// Commands emitted so far.
    pub fn decisions(&self) -> u64 {
        self.decisions
    }

    /// Turn the next decision into a command, or `None` when disabled or
    /// when nothing is worth doing.
    pub fn plan(&mut self, engine: &Engine) -> Option<Command> {
        let summary = engine.summary();
        if !summary.autopilot_enabled {
            return None;
        }
        let decision = decide(&summary, &engine.catalog, &self.config)?;
        self.decisions += 1;

        let command = match decision {
            Decision::SpawnBots { count, reason } => {
                info!(
                    target: "botworks::autopilot",
                    tick = summary.tick,
                    count,
                    ?reason,
                    "spawning bots"
                );
                Command::SpawnBots { count }
            }
            Decision::Build { kind, reason } => {
                let area = self.config.placement;
                let x = area.x + self.rng.next_below(area.width);
                let y = area.y + self.rng.next_below(area.height);
                info!(
                    target: "botworks::autopilot",
                    tick = summary.tick,
                    %kind,
                    ?reason,
                    credits = summary.credits,
                    "buying machine"
                );
                Command::BuyMachine { kind, x, y }
            }
        };
        Some(command)
    }

    /// One invocation: push at most one command onto `queue`. Returns
    /// whether a command was pushed.
    pub fn tick(&mut self, engine: &Engine, queue: &mut CommandQueue) -> bool {
        match self.plan(engine) {
            Some(command) => {
                queue.push(command);
                true
            }
            None => false,
        }
    }

    /// Invoke [`tick`](Self::tick) if at least `interval_ms` of caller
    /// time has passed since the last invocation. The first poll always
    /// runs.
    pub fn poll(&mut self, engine: &Engine, queue: &mut CommandQueue, now_ms: u64) -> bool {
        let due = match self.last_run_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.config.interval_ms,
            None => true,
        };
        if !due {
            return false;
        }
        self.last_run_ms = Some(now_ms);
        self.tick(engine, queue)
    }
}

impl Default for Autopilot {
    fn default() -> Self {
        Self::new(AutopilotConfig::default())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
