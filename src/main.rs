//! Terraclaim: Nature vs Humans on a bounded grid.
//!
//! ## Usage
//!
//! - `terraclaim` - Run a seeded self-play demo
//! - `terraclaim play` - Play through the text protocol on stdin/stdout
//! - `terraclaim demo --seed 7` - Self-play with a fixed seed
//!
//! Diagnostics go to stderr; set `RUST_LOG=terraclaim=debug` to see the
//! opponent's candidate counts.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fastrand::Rng;
use tracing_subscriber::EnvFilter;

use terraclaim::constants::{DEFAULT_HEIGHT, DEFAULT_WIDTH, DEMO_TURN_LIMIT};
use terraclaim::grid::Coord;
use terraclaim::protocol::ProtocolEngine;
use terraclaim::session::{Session, SessionConfig};
use terraclaim::turn::TurnState;

/// Terraclaim: a Nature vs Humans territory game
#[derive(Parser)]
#[command(name = "terraclaim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Text layout to start from (one row per line)
    #[arg(long, global = true)]
    map: Option<PathBuf>,

    /// Board width when no map is given
    #[arg(long, global = true, default_value_t = DEFAULT_WIDTH as usize)]
    width: usize,

    /// Board height when no map is given
    #[arg(long, global = true, default_value_t = DEFAULT_HEIGHT as usize)]
    height: usize,

    /// Seed for all randomness
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play through the text protocol on stdin/stdout
    Play,
    /// Let a random nature player face the opponent engine
    Demo,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("terraclaim=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.map {
        Some(path) => SessionConfig {
            layout: std::fs::read_to_string(path)
                .with_context(|| format!("reading map {}", path.display()))?,
            seed: cli.seed,
        },
        None => SessionConfig::blank(cli.width, cli.height, cli.seed),
    };

    match cli.command {
        Some(Commands::Play) => {
            let mut engine = ProtocolEngine::new(config).context("loading map")?;
            engine.run(std::io::stdin().lock(), std::io::stdout())?;
        }
        Some(Commands::Demo) | None => run_demo(&config)?,
    }
    Ok(())
}

fn run_demo(config: &SessionConfig) -> Result<()> {
    println!("Terraclaim: Nature vs Humans\n");

    let mut session = Session::new(config).context("loading map")?;
    let mut player_rng = config.seed.map_or_else(Rng::new, Rng::with_seed);
    session.start_game();
    println!("{}", session.board());

    for turn in 1..=DEMO_TURN_LIMIT {
        if session.state() == TurnState::Ended {
            break;
        }

        if let Some(anchor) = pick_anchor(&session, &mut player_rng) {
            let name = session.dispenser().deployed().map_or("-", |p| p.name());
            session.place_piece(anchor);
            println!("Turn {turn}: nature drops {name} at {anchor}");
        } else {
            println!("Turn {turn}: nature has nowhere to drop its piece");
        }

        if session.end_player_turn() {
            session.run_opponent_turn();
        }
        println!("{}", session.board());
    }

    match session.outcome() {
        Some(outcome) => println!("{}", outcome.message()),
        None => println!("No result after {DEMO_TURN_LIMIT} turns"),
    }
    Ok(())
}

/// A random anchor where at least one tile of the piece in hand fits.
fn pick_anchor(session: &Session, rng: &mut Rng) -> Option<Coord> {
    let board = session.board();
    let mut anchors: Vec<Coord> = (0..board.height())
        .flat_map(|y| (0..board.width()).map(move |x| Coord::new(x, y)))
        .collect();
    rng.shuffle(&mut anchors);
    anchors
        .into_iter()
        .find(|&a| session.preview_piece(a).iter().any(|&(_, _, ok)| ok))
}
