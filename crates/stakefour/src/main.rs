//! # STAKEFOUR Simulator
//!
//! Plays scripted matches against the engine from several threads while a
//! projector listener builds the read model, then checks both sides agree.
//!
//! ```text
//! cargo run -p stakefour -- --config data/config/engine.toml --threads 4 --games 8
//! ```

mod script;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use alloy_primitives::{Address, U256};
use anyhow::{bail, Context};
use clap::Parser;
use parking_lot::RwLock;
use stakefour_engine::{EngineConfig, GameEngine};
use stakefour_projector::{Projection, ProjectorListener, RecordStatus};
use tracing::info;

use crate::script::SCRIPTS;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Engine config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Worker threads, each with its own pair of players.
    #[arg(short, long, default_value_t = 4)]
    threads: u8,

    /// Matches played by each thread.
    #[arg(short, long, default_value_t = 8)]
    games: u32,

    /// Stake per side, in wei.
    #[arg(short, long, default_value_t = 1_000_000_000_000_000)]
    stake: u64,

    /// Maximum log level.
    #[arg(short, long, default_value_t = tracing::Level::INFO)]
    log_level: tracing::Level,
}

/// Deterministic identity for seat `seat` of worker `worker`.
fn player(worker: u8, seat: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[18] = worker;
    bytes[19] = seat;
    Address::from(bytes)
}

fn main() -> anyhow::Result<()> {
    // Parse args
    let args = Args::parse();

    // Create logger
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    // Load config
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let engine = Arc::new(GameEngine::new(config).context("failed to create engine")?);
    let stake = U256::from(args.stake);

    // Start projector
    let projection = Arc::new(RwLock::new(Projection::default()));
    let mut listener = ProjectorListener::attach(Arc::clone(&engine), Arc::clone(&projection));
    let listener_handle = listener.handle();
    let listener_thread = thread::Builder::new()
        .name("projector".into())
        .spawn(move || listener.run(Duration::from_millis(10)))
        .context("failed to spawn projector thread")?;

    // Play matches
    let start = Instant::now();
    let workers: Vec<_> = (0..args.threads)
        .map(|worker| {
            let engine = Arc::clone(&engine);
            let games = args.games;
            thread::Builder::new()
                .name(format!("worker-{worker}"))
                .spawn(move || -> anyhow::Result<U256> {
                    let (challenger, opponent) = (player(worker, 1), player(worker, 2));
                    let mut won = U256::ZERO;
                    for n in 0..games {
                        let script = &SCRIPTS[n as usize % SCRIPTS.len()];
                        let (id, paid) =
                            script::play(&engine, script, challenger, opponent, stake)
                                .with_context(|| format!("worker {worker}: {} failed", script.name))?;
                        tracing::debug!(worker, game_id = id, script = script.name, "match done");
                        won += paid;
                    }
                    Ok(won)
                })
                .context("failed to spawn worker")
        })
        .collect::<anyhow::Result<_>>()?;

    let mut total_won = U256::ZERO;
    for worker in workers {
        let won = worker
            .join()
            .map_err(|_| anyhow::anyhow!("worker panicked"))??;
        total_won += won;
    }
    let elapsed = start.elapsed();

    // Let the projector catch up, then stop it
    let expected = engine.game_count();
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        let view = projection.read();
        let finished = view
            .records()
            .iter()
            .filter(|r| r.status == RecordStatus::Finished)
            .count();
        if finished == expected {
            break;
        }
        drop(view);
        thread::sleep(Duration::from_millis(10));
    }
    listener_handle.stop();
    listener_thread
        .join()
        .map_err(|_| anyhow::anyhow!("projector thread panicked"))?;

    // Report
    let outbox = engine.outbox_stats();
    info!(
        games = expected,
        elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        paid_out = %engine.paid_out(),
        escrow_held = %engine.escrow_held(),
        published = outbox.published,
        dropped = outbox.dropped,
        "simulation finished"
    );

    let view = projection.read();
    info!(
        records = view.len(),
        applied = view.applied(),
        duplicates = view.duplicates(),
        unknown = view.unknown(),
        "projection"
    );
    for worker in 0..args.threads {
        let challenger = player(worker, 1);
        info!(
            worker,
            %challenger,
            games = view.games_for(&challenger).len(),
            balance = %engine.balance_of(&challenger),
            "player"
        );
    }

    if view.len() != expected {
        bail!("projection has {} records, engine has {expected} games", view.len());
    }
    if total_won != engine.paid_out() || !engine.escrow_held().is_zero() {
        bail!("escrow accounting mismatch");
    }
    Ok(())
}
