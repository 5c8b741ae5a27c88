//! Arena CLI: run bot-vs-bot experiments from the command line.
//!
//! Usage:
//!   cargo run --release --bin arena -- --games 200 --bot hard --bot easy
//!   cargo run --release --bin arena -- --games 100 --bot defensive_v2 --bot diffusion --bot aggressive

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use punto_engine::engine::arena::{run_arena, unique_labels};
use punto_engine::engine::bot_profiles::{load_default_profiles, load_profiles, BotProfilesFile};
use punto_engine::engine::bot_strategy::{MoveSelector, StrategyKind};

#[derive(Parser)]
#[command(name = "arena", about = "Run bot-vs-bot arena experiments for Punto")]
struct Cli {
    /// Number of games to play
    #[arg(long, default_value = "100")]
    games: usize,

    /// Random seed
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Alternate seat positions between games
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    alternate_seats: bool,

    /// Path to bot_profiles.toml
    #[arg(long, env = "PUNTO_BOT_PROFILES")]
    profiles: Option<PathBuf>,

    /// Worker threads (default: one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Bot as a profile name, difficulty tier or strategy, 2 to 4 times
    #[arg(long = "bot", required = true)]
    bots: Vec<String>,
}

fn build_strategy(spec: &str, profiles: &BotProfilesFile) -> Result<(StrategyKind, Box<dyn MoveSelector>), String> {
    let kind = match profiles.resolve(spec) {
        Some(profile) => profile.strategy_type,
        None => spec.parse::<StrategyKind>()?,
    };
    if !kind.is_computer() {
        return Err(format!("{spec:?} needs a human; the arena only seats bots"));
    }
    Ok((kind, kind.build()))
}

fn main() {
    // RUST_LOG=info adds per-game lifecycle events.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(LevelFilter::WARN.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if !(2..=4).contains(&cli.bots.len()) {
        eprintln!("Error: the arena needs 2 to 4 bots, got {}", cli.bots.len());
        std::process::exit(1);
    }

    if let Some(threads) = cli.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global() {
            eprintln!("Warning: could not size thread pool: {}", e);
        }
    }

    // Load profiles
    let profiles = match &cli.profiles {
        Some(path) => load_profiles(path).unwrap_or_else(|e| {
            eprintln!("Error loading profiles: {}", e);
            std::process::exit(1);
        }),
        None => load_default_profiles(),
    };

    // Build strategies
    let mut strategies: Vec<(String, Box<dyn MoveSelector>)> = Vec::with_capacity(cli.bots.len());
    let mut kinds = Vec::with_capacity(cli.bots.len());
    eprintln!("Arena: {} games, seed={}, alternate_seats={}", cli.games, cli.seed, cli.alternate_seats);
    for spec in &cli.bots {
        let (kind, selector) = build_strategy(spec, &profiles).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            eprintln!("Available profiles: {:?}", profiles.profiles.keys().collect::<Vec<_>>());
            std::process::exit(1);
        });
        kinds.push(kind);
        strategies.push((spec.clone(), selector));
    }
    for (label, kind) in unique_labels(&strategies).iter().zip(&kinds) {
        eprintln!("  {}: type={}", label, kind);
    }
    eprintln!();

    let total = cli.games;
    let progress_cb = move |done: usize, _total: usize| {
        eprint!("\r  [{}/{}] games completed", done, total);
    };

    let result = run_arena(&strategies, cli.games, cli.seed, cli.alternate_seats, Some(&progress_cb));

    eprintln!("\r                                    "); // clear progress line
    println!("{}", result.summary());
}
