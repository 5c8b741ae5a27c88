//! `punto`: play a local match in the terminal.
//!
//! Usage:
//!   cargo run --bin punto -- --player you:manual --player bot:hard
//!   cargo run --bin punto -- -p a:aggressive -p b:diffusion -p c:random --seed 7 --json

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing_subscriber::EnvFilter;

use punto_engine::engine::bot_profiles::{load_default_profiles, load_profiles, BotProfilesFile};
use punto_engine::engine::bot_strategy::{MoveSelector, StrategyKind};
use punto_engine::engine::game::Match;
use punto_engine::engine::models::{MatchConfig, Outcome, Player};
use punto_engine::engine::simulator::{play_match, TurnRecord};
use punto_engine::games::punto::{Board, PlayerId, Tile};

#[derive(Parser)]
#[command(name = "punto", about = "Play Punto against bots or other people at this terminal")]
struct Cli {
    /// Seat as `name:strategy` or `name:profile`, in turn order (2 to 4 seats)
    #[arg(short, long = "player", default_values_t = ["you:manual".to_string(), "bot:default".to_string()])]
    players: Vec<String>,

    /// Seed for the tile shuffle and bot decisions
    #[arg(long, env = "PUNTO_SEED")]
    seed: Option<u64>,

    /// Path to bot_profiles.toml (default: auto-discover)
    #[arg(long, env = "PUNTO_BOT_PROFILES")]
    profiles: Option<PathBuf>,

    /// Skip the bots' think delay
    #[arg(long)]
    no_delay: bool,

    /// Print only the final match snapshot as JSON
    #[arg(long)]
    json: bool,
}

struct Seat {
    name: String,
    selector: Box<dyn MoveSelector>,
    is_computer: bool,
    think_delay: Duration,
}

fn parse_seat(spec: &str, profiles: &BotProfilesFile) -> Result<Seat, String> {
    let (name, what) = spec
        .split_once(':')
        .ok_or_else(|| format!("seat {spec:?} is not of the form name:strategy"))?;
    if name.is_empty() {
        return Err(format!("seat {spec:?} has no name"));
    }

    if let Some(profile) = profiles.resolve(what) {
        return Ok(Seat {
            name: name.to_string(),
            selector: profile.build(),
            is_computer: profile.strategy_type.is_computer(),
            think_delay: profile.think_delay(),
        });
    }
    let kind: StrategyKind = what.parse()?;
    Ok(Seat {
        name: name.to_string(),
        selector: kind.build(),
        is_computer: kind.is_computer(),
        think_delay: Duration::ZERO,
    })
}

/// Holds a bot back for a moment so people can follow its moves.
struct Paced<'a> {
    inner: &'a dyn MoveSelector,
    delay: Duration,
}

impl MoveSelector for Paced<'_> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn select_move(&self, board: &Board, player: &Player, players: &[Player], rng: &mut dyn RngCore) -> Option<Tile> {
        std::thread::sleep(self.delay);
        self.inner.select_move(board, player, players, rng)
    }
}

fn describe(record: &TurnRecord, name: &str) -> String {
    let tried = match record.tile {
        Some(t) => format!("{} at {},{}", t.value, t.x, t.y),
        None => "nothing".to_string(),
    };
    let verdict = match record.outcome {
        Outcome::Placed => "placed",
        Outcome::Rejected => "rejected, penalty",
        Outcome::Disqualified => "rejected, disqualified",
        Outcome::Won => "placed, four in a row",
        Outcome::Drawn => "placed, out of tiles",
    };
    format!("{name} played {tried}: {verdict}")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let profiles = match cli.profiles {
        Some(ref path) => match load_profiles(path) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => load_default_profiles(),
    };

    let seats: Vec<Seat> = cli
        .players
        .iter()
        .map(|spec| parse_seat(spec, &profiles))
        .collect::<Result<_, _>>()?;
    if !(2..=4).contains(&seats.len()) {
        return Err(format!("Punto needs 2 to 4 seats, got {}", seats.len()).into());
    }

    let mut game = Match::new(&MatchConfig { max_players: seats.len(), random_seed: cli.seed });
    let mut ids: Vec<PlayerId> = Vec::with_capacity(seats.len());
    for seat in &seats {
        ids.push(game.add_player(&seat.name, seat.is_computer)?);
    }

    let paced: Vec<Paced> = seats
        .iter()
        .map(|s| Paced {
            inner: s.selector.as_ref(),
            delay: if cli.no_delay || cli.json { Duration::ZERO } else { s.think_delay },
        })
        .collect();
    let seated: Vec<(PlayerId, &dyn MoveSelector)> = ids
        .iter()
        .zip(&paced)
        .map(|(&id, p)| (id, p as &dyn MoveSelector))
        .collect();

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed.rotate_left(32)),
        None => StdRng::from_entropy(),
    };

    if !cli.json {
        print!("{}", game.snapshot().render());
    }
    let quiet = cli.json;
    play_match(&mut game, &seated, &mut rng, |game, record| {
        if quiet {
            return;
        }
        let snapshot = game.snapshot();
        let name = snapshot.name_of(record.player).unwrap_or("?");
        println!("\n{}", describe(record, name));
        print!("{}", snapshot.render());
    });

    let snapshot = game.snapshot();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    Ok(())
}
