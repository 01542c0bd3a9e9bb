//! Round engine player and batch simulator
//!
//! Usage:
//!   rf-round-sim play --spins 20 --config math.yaml
//!   rf-round-sim simulate --sessions 64 --spins 10000 --seed 1
//!   rf-round-sim simulate --set hit_rate=0.35 --set qa_verbose=false

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;

use rf_slot_round::{
    LogPresenter, MathSpec, NullPresenter, RawConfig, RoundEngine, SessionStats, SpinRejection,
};

#[derive(Parser)]
#[command(name = "rf-round-sim", about = "Reel-slot round engine player and simulator")]
struct Cli {
    /// Math config file (JSON, or YAML by extension)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override a config key, e.g. `--set hit_rate=0.3`
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    overrides: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one session, logging every round
    Play {
        /// Spin requests to make
        #[arg(short, long, default_value_t = 20)]
        spins: u64,
        /// RNG seed (overrides the config; 0 = random)
        #[arg(long)]
        seed: Option<u64>,
        /// Settle delay before each round returns to IDLE
        #[arg(long, default_value_t = 0)]
        settle_ms: u64,
    },
    /// Run independent sessions in parallel and print aggregate stats as JSON
    Simulate {
        /// Number of sessions
        #[arg(long, default_value_t = 16)]
        sessions: u64,
        /// Spin requests per session
        #[arg(short, long, default_value_t = 10_000)]
        spins: u64,
        /// Session i is seeded with `seed + i`
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Pretty-print the report
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    sessions: u64,
    spins_per_session: u64,
    seed: u64,
    rtp: f64,
    hit_rate: f64,
    /// Bonus triggers per paid spin
    bonus_frequency: f64,
    stats: SessionStats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Per-round logging would swamp a batch run
    let default_filter = match cli.command {
        Commands::Play { .. } => "info",
        Commands::Simulate { .. } => "warn",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let raw = load_raw(cli.config.as_deref(), &cli.overrides)?;
    let spec = MathSpec::resolve(&raw);

    match cli.command {
        Commands::Play {
            spins,
            seed,
            settle_ms,
        } => play(spec, spins, seed, settle_ms),
        Commands::Simulate {
            sessions,
            spins,
            seed,
            pretty,
        } => simulate(spec, sessions, spins, seed, pretty),
    }
}

fn load_raw(path: Option<&Path>, overrides: &[String]) -> Result<RawConfig> {
    let mut raw = match path {
        Some(path) => RawConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RawConfig::new(),
    };

    for entry in overrides {
        let Some((key, value)) = entry.split_once('=') else {
            bail!("Override `{entry}` is not KEY=VALUE");
        };
        raw.set(key.trim(), value.trim());
    }

    Ok(raw)
}

fn play(mut spec: MathSpec, spins: u64, seed: Option<u64>, settle_ms: u64) -> Result<()> {
    if let Some(seed) = seed {
        spec.rng_seed = seed;
    }
    let mut engine = RoundEngine::new(spec);
    let mut session = engine.new_session();
    let mut presenter = if settle_ms > 0 {
        LogPresenter::with_settle_delay(Duration::from_millis(settle_ms))
    } else {
        LogPresenter::new()
    };

    for request in 1..=spins {
        let outcomes = match engine.spin(&mut session, &mut presenter) {
            Ok(outcomes) => outcomes,
            Err(rejection @ SpinRejection::InsufficientBalance { .. }) => {
                log::warn!("spin {request} rejected: {rejection}");
                break;
            }
            Err(rejection) => return Err(rejection.into()),
        };

        for outcome in &outcomes {
            println!("{}", outcome.grid.render());
            println!(
                "{:?} bet={} win={} balance={} free_spins={}\n",
                outcome.kind,
                outcome.bet,
                outcome.total_win(),
                outcome.balance_after,
                session.free_spins_remaining
            );
        }
    }

    println!("{}", serde_json::to_string_pretty(&session.stats)?);
    log::info!(
        "seed {} | rtp {:.2}% | hit rate {:.2}%",
        engine.seed(),
        session.stats.rtp(),
        session.stats.hit_rate()
    );
    Ok(())
}

fn simulate(spec: MathSpec, sessions: u64, spins: u64, seed: u64, pretty: bool) -> Result<()> {
    log::info!("simulating {sessions} sessions x {spins} spins from seed {seed}");

    let per_session: Vec<SessionStats> = (0..sessions)
        .into_par_iter()
        .map(|i| run_session(spec.clone(), seed.wrapping_add(i), spins))
        .collect();

    let mut stats = SessionStats::default();
    for session in &per_session {
        stats.merge(session);
    }

    let report = SimulationReport {
        sessions,
        spins_per_session: spins,
        seed,
        rtp: stats.rtp(),
        hit_rate: stats.hit_rate(),
        bonus_frequency: if stats.paid_spins > 0 {
            stats.bonus_triggers as f64 / stats.paid_spins as f64
        } else {
            0.0
        },
        stats,
    };

    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}

fn run_session(mut spec: MathSpec, seed: u64, spins: u64) -> SessionStats {
    spec.rng_seed = seed;
    let mut engine = RoundEngine::new(spec);
    let mut session = engine.new_session();
    // Simulations measure the math, not bankroll
    session.balance = u64::MAX / 4;

    for _ in 0..spins {
        if let Err(rejection) = engine.spin(&mut session, &mut NullPresenter) {
            log::warn!("session {seed} stopped: {rejection}");
            break;
        }
    }
    session.stats
}
