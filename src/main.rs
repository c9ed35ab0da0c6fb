use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use serde_json::json;
use snake_engine::config::{DEFAULT_GRID_HEIGHT, DEFAULT_GRID_WIDTH, EngineConfig, GridSize};
use snake_engine::input::Command;
use snake_engine::score::{FileStore, HighScoreStore, MemoryStore};
use snake_engine::session::GameSession;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Headless Snake driver: one command per line on stdin, one JSON state per
/// line on stdout.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Board width in cells.
    #[arg(long, default_value_t = DEFAULT_GRID_WIDTH)]
    width: u16,

    /// Board height in cells.
    #[arg(long, default_value_t = DEFAULT_GRID_HEIGHT)]
    height: u16,

    /// Seed food placement for a reproducible game.
    #[arg(long)]
    seed: Option<u64>,

    /// High score file (defaults to the per-user data directory).
    #[arg(long = "score-file", conflicts_with = "no_persist")]
    score_file: Option<PathBuf>,

    /// Keep the high score in memory only.
    #[arg(long = "no-persist")]
    no_persist: bool,
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let store = open_store(&cli);
    let config = EngineConfig {
        grid: GridSize {
            width: cli.width,
            height: cli.height,
        },
        seed: cli.seed,
    };
    let session = GameSession::new(config, store)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))?;

    info!(
        width = cli.width,
        height = cli.height,
        high_score = session.high_score(),
        "engine ready"
    );

    run(&session, io::stdin().lock(), io::stdout().lock())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "snake_engine=info".into()),
        )
        .with_writer(io::stderr)
        .init();
}

fn open_store(cli: &Cli) -> Box<dyn HighScoreStore> {
    if cli.no_persist {
        return Box::new(MemoryStore::default());
    }

    let store = match &cli.score_file {
        Some(path) => FileStore::new(path),
        None => FileStore::at_default_location(),
    };
    debug!(path = %store.path().display(), "using high score file");
    Box::new(store)
}

fn run<S, R, W>(session: &GameSession<S>, input: R, mut output: W) -> io::Result<()>
where
    S: HighScoreStore,
    R: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(error) => {
                warn!(%error, "rejected driver input");
                write_json(&mut output, &json!({ "error": error.to_string() }))?;
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Reset => write_json(&mut output, &session.reset())?,
            Command::Start => write_json(&mut output, &session.start())?,
            Command::Restart => write_json(&mut output, &session.restart())?,
            Command::Pause => write_json(&mut output, &session.toggle_pause())?,
            Command::Direction(token) => write_json(&mut output, &session.set_direction(&token))?,
            Command::Tick(count) => {
                let mut snapshot = session.state();
                for _ in 0..count {
                    snapshot = session.update();
                }
                write_json(&mut output, &snapshot)?;
            }
            Command::State => write_json(&mut output, &session.state())?,
            Command::HighScore => write_json(
                &mut output,
                &json!({ "highscore": session.high_score() }),
            )?,
        }
    }

    Ok(())
}

fn write_json<W: Write, T: Serialize>(output: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer(&mut *output, value)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;
    writeln!(output)?;
    output.flush()
}
