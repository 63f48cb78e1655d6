//! # Horizon - Goal Tracking CLI
//!
//! A local goal tracker. Goals are broken down into time-bounded periods, and
//! periods into checklist tasks; progress rolls up from tasks to periods to
//! goals to an overall completion rate.
//!
//! ## Quick Start
//!
//! ```bash
//! # Tell it who you are
//! horizon profile --name Sam
//!
//! # A goal with a 3 month horizon
//! horizon new "Run a half marathon" --duration 3 --unit months --icon 🏃
//!
//! # Break it down
//! horizon period add "half marathon" "Month 1" --end "end of month"
//! horizon task add "#1" "Month 1" "Run 5k three times"
//! horizon task toggle "#1" "Month 1" "#1"
//!
//! # See where you stand
//! horizon list
//! horizon view "#1"
//! horizon stats
//! ```
//!
//! Goals, periods and tasks can be referenced by id, unique id prefix,
//! case-insensitive name, or `#N` position.
//!
//! `horizon shell` keeps a session open with background autosave.
//!
//! Data is stored in `~/.goal-horizon/state.json` (or `$HORIZON_HOME/state.json`,
//! or wherever `--db` points) as a single JSON document.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod autosave;
pub mod cli;
pub mod cmd;
pub mod colors;
pub mod dates;
pub mod db;
pub mod display;
pub mod error;
pub mod fields;
pub mod goal;
pub mod progress;
pub mod shell;
pub mod store;

use cli::Cli;
use cmd::{execute, Commands, Context, Effect};
use db::{load_or_preserve, JsonFileGateway, PersistenceGateway};

const DATA_FILE: &str = "state.json";

/// Where the data file lives: `--db`, then `$HORIZON_HOME`, then `$HOME/.goal-horizon`.
fn resolve_data_path(db: Option<PathBuf>, horizon_home: Option<String>, home: Option<String>) -> PathBuf {
    if let Some(db) = db {
        return db;
    }
    if let Some(dir) = horizon_home.filter(|d| !d.is_empty()) {
        return PathBuf::from(dir).join(DATA_FILE);
    }
    let home = home.unwrap_or_else(|| ".".to_string());
    PathBuf::from(home).join(".goal-horizon").join(DATA_FILE)
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let db_path = resolve_data_path(
        cli.db,
        std::env::var("HORIZON_HOME").ok(),
        std::env::var("HOME").ok(),
    );
    let color = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    let gateway = Arc::new(JsonFileGateway::new(&db_path));

    if let Commands::Shell { autosave_secs } = cli.command {
        let interval = Duration::from_secs(autosave_secs.max(1));
        if let Err(e) = shell::run_shell(&db_path, gateway, interval, color) {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
        return;
    }

    let (mut state, _) = load_or_preserve(&*gateway, &db_path);
    let ctx = Context {
        db_path: &db_path,
        now: Local::now().naive_local(),
        color,
    };
    let mut stdout = std::io::stdout();

    match execute(&mut state, cli.command, &ctx, &mut stdout) {
        Ok(Effect::Mutated) => {
            if let Err(e) = gateway.save(&state) {
                eprintln!("Failed to save {}: {e}", db_path.display());
                std::process::exit(1);
            }
        }
        Ok(Effect::Unchanged) => {}
        Err(e) => {
            eprintln!("Error ({}): {e}", e.kind());
            std::process::exit(1);
        }
    }
}
