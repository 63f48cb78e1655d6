use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::cmd::Commands;

/// Local goal tracker: goals break down into periods, periods into tasks.
/// Storage defaults to ~/.goal-horizon/state.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "horizon", version, about = "Track goals, periods and tasks from the terminal")]
pub struct Cli {
    /// Path to the JSON data file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Parser for a single line typed into the interactive shell.
#[derive(Parser)]
#[command(name = "horizon", no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: Commands,
}
