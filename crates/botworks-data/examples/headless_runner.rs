//! Headless run: load settings and a scenario, let the autopilot grow the
//! factory, then replay the recorded session to check determinism.
//!
//! Run with: `cargo run -p botworks-data --example headless_runner [DATA_DIR] [TICKS]`
//!
//! Without a data directory the demo scenario and default settings are
//! used. Set `RUST_LOG=botworks::autopilot=info` to watch decisions.

use std::path::PathBuf;

use botworks_autopilot::Autopilot;
use botworks_core::bot::BotTask;
use botworks_core::command::{Command, CommandQueue};
use botworks_core::engine::Engine;
use botworks_core::fixed::{fixed64_to_f64, fixed_int};
use botworks_core::replay::Recorder;
use botworks_core::validation::verify_determinism;
use botworks_data::{GameSetup, Scenario, Settings, load_data_dir};
use tracing_subscriber::EnvFilter;

/// Frames per second of simulated wall time.
const FRAME_RATE: u64 = 60;
const SESSION_SEED: u64 = 2024;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let setup = match args.next() {
        Some(dir) => load_data_dir(&PathBuf::from(dir))?,
        None => GameSetup {
            settings: Settings::default(),
            scenario: Scenario::demo(),
        },
    };
    let ticks: u64 = match args.next() {
        Some(n) => n.parse()?,
        None => 36_000,
    };

    let engine = setup.build_engine()?;
    let mut recorder = Recorder::new(engine, SESSION_SEED)?.with_checkpoints(1000);
    let mut autopilot = Autopilot::new(setup.settings.autopilot.clone());
    let mut queue = CommandQueue::new();

    queue.push_batch(setup.scenario.commands());
    queue.push(Command::SetAutopilotEnabled { enabled: true });
    for command in queue.drain(0) {
        recorder.apply(command, 0);
    }

    println!(
        "=== {} : {} machines, {} bots, {} credits ===\n",
        setup.scenario.name,
        recorder.engine().state.machine_count(),
        recorder.engine().state.bot_count(),
        recorder.engine().state.credits,
    );

    for tick in 0..ticks {
        let now_ms = tick * 1000 / FRAME_RATE;
        autopilot.poll(recorder.engine(), &mut queue, now_ms);
        for command in queue.drain(tick) {
            let outcome = recorder.apply(command, tick);
            if let Some(reason) = outcome.rejection() {
                println!("tick {tick}: rejected ({reason})");
            }
        }
        recorder.apply(
            Command::Tick {
                delta: fixed_int(1),
            },
            tick,
        );

        if (tick + 1) % (FRAME_RATE * 60) == 0 {
            let s = recorder.engine().summary();
            println!(
                "t={:>6}  credits={:>8}  bots={:>5} (idle {:>5})  machines={:>4}  scale={}",
                s.tick,
                s.credits,
                s.bot_count,
                s.idle_bots,
                s.machine_count(),
                fixed64_to_f64(s.time_scale),
            );
        }
    }

    print_machines(recorder.engine());
    print_bots(recorder.engine());
    println!("\nAutopilot decisions: {}", autopilot.decisions());

    let (live, log) = recorder.finish();
    println!("Recorded commands:   {}", log.command_count());
    let report = verify_determinism(&live, &log)?;
    if report.is_deterministic() {
        println!("Determinism replay:  PASSED ({:#018x})", report.live_hash);
    } else {
        println!(
            "Determinism replay:  FAILED (live {:#018x}, replay {:#018x})",
            report.live_hash, report.replay_hash
        );
        if let Some(diff) = report.diff {
            println!("  subsystems: {:?}", diff.subsystem_diffs);
        }
    }
    Ok(())
}

fn print_machines(engine: &Engine) {
    println!("\n{:>5}  {:<20} {:>8} {:>8} {:>9}  inventory", "id", "kind", "x", "y", "progress");
    for m in engine.snapshot_all_machines() {
        let stock: Vec<String> = m.inventory.iter().map(|(r, q)| format!("{r}={q}")).collect();
        println!(
            "{:>5}  {:<20} {:>8.1} {:>8.1} {:>8.0}%  {}",
            m.id.0,
            m.kind.name(),
            fixed64_to_f64(m.x),
            fixed64_to_f64(m.y),
            fixed64_to_f64(m.progress) * 100.0,
            stock.join(" "),
        );
    }
}

fn print_bots(engine: &Engine) {
    let bots = engine.snapshot_bots();
    let (mut idle, mut pickup, mut deliver) = (0usize, 0usize, 0usize);
    let mut travel = 0.0;
    for b in &bots {
        match b.task {
            BotTask::Idle => idle += 1,
            BotTask::MovingToPickup { .. } => pickup += 1,
            BotTask::MovingToDeliver { .. } => deliver += 1,
        }
        travel += b.remaining.map(fixed64_to_f64).unwrap_or(0.0);
    }
    let moving = pickup + deliver;
    println!(
        "\nBots: {idle} idle, {pickup} to pickup, {deliver} to deliver, {} carrying",
        bots.iter().filter(|b| b.payload.is_some()).count(),
    );
    if moving > 0 {
        println!("  mean distance left: {:.1}", travel / moving as f64);
    }
}
