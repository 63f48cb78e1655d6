//! Interactive session.
//!
//! Keeps the state in memory across commands and hands saving to the
//! autosaver: every mutating command requests a save without waiting for it,
//! and the timer saves periodically once the data file is in step.
//! Confirmation prompts are answered before the state lock is taken.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Local;
use clap::Parser;
use tracing::info;

use crate::autosave::Autosaver;
use crate::cli::ShellLine;
use crate::cmd::{confirm_upfront, execute, Context, Effect};
use crate::db::{load_or_preserve, PersistenceGateway};
use crate::error::{GoalError, GoalResult};

/// Split a command line into arguments, honouring single and double quotes.
pub fn split_args(line: &str) -> GoalResult<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_arg = false;

    for ch in line.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(ch);
                in_arg = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_arg = true;
            }
        }
    }

    if quote.is_some() {
        return Err(GoalError::validation("unterminated quote"));
    }
    if in_arg {
        args.push(current);
    }
    Ok(args)
}

pub fn run_shell(
    db_path: &Path,
    gateway: Arc<dyn PersistenceGateway>,
    autosave: Duration,
    color: bool,
) -> GoalResult<()> {
    let (loaded, from_disk) = load_or_preserve(&*gateway, db_path);
    let state = Arc::new(Mutex::new(loaded));
    let saver = Autosaver::spawn(Arc::clone(&state), Arc::clone(&gateway), autosave, from_disk);
    info!(interval_secs = autosave.as_secs(), from_disk, "shell started");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    writeln!(stdout, "Goal Horizon shell. Type `help` for commands, `exit` to leave.")?;

    loop {
        write!(stdout, "horizon> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            writeln!(stdout)?;
            break;
        }
        let line = line.trim();
        match line {
            "" => continue,
            "exit" | "quit" => break,
            _ => {}
        }

        let args = match split_args(line) {
            Ok(args) => args,
            Err(e) => {
                eprintln!("Error: {e}");
                continue;
            }
        };
        let parsed = match ShellLine::try_parse_from(args) {
            Ok(parsed) => parsed,
            Err(e) => {
                let _ = e.print();
                continue;
            }
        };

        let command = match confirm_upfront(parsed.command, &mut stdout) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("Error: {e}");
                continue;
            }
        };

        let ctx = Context {
            db_path,
            now: Local::now().naive_local(),
            color,
        };
        let result = match state.lock() {
            Ok(mut guard) => execute(&mut guard, command, &ctx, &mut stdout),
            Err(_) => Err(GoalError::Storage("session state is unavailable".into())),
        };
        match result {
            Ok(Effect::Mutated) => saver.request_save(),
            Ok(Effect::Unchanged) => {}
            Err(e) => eprintln!("Error: {e}"),
        }
        if let Some(e) = saver.last_error() {
            eprintln!("Warning: changes are not being saved: {e}");
        }
    }

    match saver.shutdown() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
