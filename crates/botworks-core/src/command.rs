//! Discrete external intents and their handlers.
//!
//! A [`Command`] is applied to an [`Engine`](crate::engine::Engine) together
//! with a [`StepContext`] carrying the random source and timestamp, so that
//! re-feeding the same command log reproduces the same state. Invalid
//! commands leave the state untouched and come back as a [`Rejection`];
//! nothing in this module can fail in any other way.

use serde::{Deserialize, Serialize};

use crate::bot::BotTask;
use crate::catalog::{Catalog, MachineKind};
use crate::config::SimConfig;
use crate::engine::TickReport;
use crate::fixed::{Fixed64, Ticks};
use crate::id::{BotId, MachineId};
use crate::machine::{Machine, MachineBlueprint};
use crate::rng::SimRng;
use crate::state::FactoryState;

// ---------------------------------------------------------------------------
// Command enum
// ---------------------------------------------------------------------------

/// A single intent submitted to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Advance the simulation by `delta` units of time.
    Tick { delta: Fixed64 },
    /// Add `count` idle bots at random positions.
    SpawnBots { count: u32 },
    /// Place a machine for free. Used to seed scenarios.
    AddMachine { blueprint: MachineBlueprint },
    /// Pay for and place a machine with the current catalog recipe.
    BuyMachine {
        kind: MachineKind,
        x: Fixed64,
        y: Fixed64,
    },
    /// Send every bot back to idle and drop whatever it carries.
    MarketCrash,
    /// Send one bot back to idle. Its payload is kept.
    ResetBot { bot: BotId },
    /// Replace the time-scale multiplier.
    SetTimeScale { multiplier: Fixed64 },
    SetAutopilotEnabled { enabled: bool },
}

impl Command {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Tick { .. } => "tick",
            Command::SpawnBots { .. } => "spawn_bots",
            Command::AddMachine { .. } => "add_machine",
            Command::BuyMachine { .. } => "buy_machine",
            Command::MarketCrash => "market_crash",
            Command::ResetBot { .. } => "reset_bot",
            Command::SetTimeScale { .. } => "set_time_scale",
            Command::SetAutopilotEnabled { .. } => "set_autopilot_enabled",
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Why a command was refused. The state is unchanged whenever one of these
/// is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("{kind} costs {cost} credits but only {available} are available")]
    InsufficientCredits {
        kind: MachineKind,
        cost: i64,
        available: i64,
    },
    #[error("no bot with id {0}")]
    UnknownBot(BotId),
    #[error("time scale must be positive, got {0}")]
    InvalidTimeScale(Fixed64),
    #[error("machine speed cannot be negative, got {0}")]
    InvalidSpeed(Fixed64),
}

/// Result of applying one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ticked(TickReport),
    /// A machine was created (bought or added).
    MachinePlaced(MachineId),
    /// `count` bots were created with consecutive ids starting at `first`.
    BotsSpawned { first: BotId, count: u32 },
    /// The command took effect and has nothing further to report.
    Applied,
    Rejected(Rejection),
}

impl Outcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected(_))
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Outcome::Rejected(r) => Some(r),
            _ => None,
        }
    }
}

/// Explicit inputs a command may consume besides the state itself.
#[derive(Debug)]
pub struct StepContext<'a> {
    pub rng: &'a mut SimRng,
    /// Caller-supplied timestamp, stamped onto newly created machines.
    pub now: Ticks,
}

impl<'a> StepContext<'a> {
    pub fn new(rng: &'a mut SimRng, now: Ticks) -> Self {
        Self { rng, now }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Append `count` idle bots scattered uniformly over the spawn area.
///
/// Each bot draws its x then its y from `rng`.
pub fn spawn_bots(
    state: &mut FactoryState,
    config: &SimConfig,
    count: u32,
    rng: &mut SimRng,
) -> Outcome {
    let first = state.peek_bot_id();
    for _ in 0..count {
        let x = rng.next_below(config.spawn_width);
        let y = rng.next_below(config.spawn_height);
        state.spawn_bot_at(x, y);
    }
    Outcome::BotsSpawned { first, count }
}

/// Place a machine from a blueprint without touching the ledger.
pub fn add_machine(
    state: &mut FactoryState,
    catalog: &Catalog,
    blueprint: &MachineBlueprint,
    now: Ticks,
) -> Outcome {
    if let Some(speed) = blueprint.speed.filter(|s| *s < Fixed64::ZERO) {
        return Outcome::Rejected(Rejection::InvalidSpeed(speed));
    }

    let id = state.allocate_machine_id();
    let mut machine = Machine::from_spec(
        id,
        blueprint.kind,
        catalog.spec(blueprint.kind),
        blueprint.x,
        blueprint.y,
        now,
    );
    if let Some(speed) = blueprint.speed {
        machine.speed = speed;
    }
    machine.inventory = blueprint.inventory.clone();
    state.insert_machine(machine);
    Outcome::MachinePlaced(id)
}

/// Debit the catalog cost and place a machine. Either both happen or
/// neither does.
pub fn buy_machine(
    state: &mut FactoryState,
    catalog: &Catalog,
    kind: MachineKind,
    x: Fixed64,
    y: Fixed64,
    now: Ticks,
) -> Outcome {
    let spec = catalog.spec(kind);
    if state.credits < spec.cost {
        return Outcome::Rejected(Rejection::InsufficientCredits {
            kind,
            cost: spec.cost,
            available: state.credits,
        });
    }

    state.credits -= spec.cost;
    let id = state.allocate_machine_id();
    state.insert_machine(Machine::from_spec(id, kind, spec, x, y, now));
    Outcome::MachinePlaced(id)
}

/// Every bot goes idle and loses its payload. Inventories and credits are
/// untouched.
pub fn market_crash(state: &mut FactoryState) -> Outcome {
    for bot in state.bots.values_mut() {
        bot.task = BotTask::Idle;
        bot.payload = None;
    }
    Outcome::Applied
}

pub fn reset_bot(state: &mut FactoryState, id: BotId) -> Outcome {
    match state.bots.get_mut(&id) {
        Some(bot) => {
            bot.task = BotTask::Idle;
            Outcome::Applied
        }
        None => Outcome::Rejected(Rejection::UnknownBot(id)),
    }
}

pub fn set_time_scale(state: &mut FactoryState, multiplier: Fixed64) -> Outcome {
    if multiplier <= Fixed64::ZERO {
        return Outcome::Rejected(Rejection::InvalidTimeScale(multiplier));
    }
    state.time_scale = multiplier;
    Outcome::Applied
}

pub fn set_autopilot_enabled(state: &mut FactoryState, enabled: bool) -> Outcome {
    state.autopilot_enabled = enabled;
    Outcome::Applied
}

// ---------------------------------------------------------------------------
// CommandQueue
// ---------------------------------------------------------------------------

/// Commands waiting for the single writer to apply them.
///
/// The autopilot pushes here instead of touching the engine. Supports
/// optional history tracking for debugging.
#[derive(Debug)]
pub struct CommandQueue {
    pending: Vec<Command>,
    /// Drained commands with the timestamp they were drained at.
    history: Vec<(Ticks, Command)>,
    /// Maximum history entries to retain. 0 = no history.
    max_history: usize,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandQueue {
    /// Create a new empty command queue with no history tracking.
    pub fn new() -> Self {
        Self::with_max_history(0)
    }

    /// Create a new command queue that retains up to `max_history` entries.
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            pending: Vec::new(),
            history: Vec::new(),
            max_history,
        }
    }

    pub fn push(&mut self, command: Command) {
        self.pending.push(command);
    }

    pub fn push_batch(&mut self, commands: impl IntoIterator<Item = Command>) {
        self.pending.extend(commands);
    }

    /// Drain all pending commands in submission order, recording them in
    /// history under `now`.
    pub fn drain(&mut self, now: Ticks) -> Vec<Command> {
        let commands: Vec<Command> = self.pending.drain(..).collect();

        if self.max_history > 0 {
            self.history
                .extend(commands.iter().map(|cmd| (now, cmd.clone())));
            let excess = self.history.len().saturating_sub(self.max_history);
            if excess > 0 {
                self.history.drain(..excess);
            }
        }

        commands
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn history(&self) -> &[(Ticks, Command)] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

// ===========================================================================
// Tests
// ===========================================================================
