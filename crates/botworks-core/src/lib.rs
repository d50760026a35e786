//! Botworks Core -- a deterministic, tick-driven factory simulation.
//!
//! Stationary machines turn resources into other resources along fixed
//! recipes, a population of bots ferries single units between them, and a
//! credit ledger pays for new machines. Everything fractional is Q32.32
//! fixed point, every random draw comes from an explicit [`rng::SimRng`],
//! and every timestamp is passed in, so the same command log always
//! produces the same state.
//!
//! # Tick pipeline
//!
//! Each [`engine::Engine::tick`] runs:
//!
//! 1. **Production** -- machines advance progress; every full 100 completes
//!    a cycle, capped by the scarcest input.
//! 2. **Logistics** -- supply and demand lists are built once, then bots
//!    advance in ascending id order: claim work, move, pick up, deliver.
//! 3. **Bookkeeping** -- the tick counter goes up by one.
//!
//! # Commands
//!
//! External intents are [`command::Command`] values applied through
//! [`engine::Engine::apply`] with a [`command::StepContext`]. Invalid
//! commands are rejected with a reason and never partially applied.
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- catalog, config, and state, plus the pipeline.
//! - [`state::FactoryState`] -- machines and bots keyed by typed ids.
//! - [`catalog::Catalog`] -- cost, recipe, and speed per machine kind.
//! - [`query::FactorySummary`] -- the aggregate view the autopilot reads.
//! - [`replay::ReplayLog`] -- snapshot plus command log for exact replay.

pub mod bot;
pub mod catalog;
pub mod command;
pub mod config;
pub mod engine;
pub mod fixed;
pub mod id;
pub mod logistics;
pub mod machine;
pub mod query;
pub mod replay;
pub mod resource;
pub mod rng;
pub mod serialize;
pub mod sim;
pub mod state;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
