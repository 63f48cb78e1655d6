//! Command implementations for the CLI interface.
//!
//! Each handler works on an in-memory `AppState` and reports whether it
//! changed anything. Saving is left to the caller: the one-shot binary saves
//! straight away, the interactive shell hands it to the autosaver.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use clap::Subcommand;
use clap_complete::{generate, Shell};
use tracing::warn;

use crate::autosave::DEFAULT_INTERVAL;
use crate::db::{create_backup, default_export_name, export_to, read_import, AppState};
use crate::dates::{end_date_from_duration, parse_date_phrase};
use crate::display::{render_goal_detail, render_goal_table, render_stats};
use crate::error::{GoalError, GoalResult};
use crate::fields::{DurationUnit, Tone};
use crate::goal::NewGoal;
use crate::progress::{percent, period_totals, progress_percent, store_stats};
use crate::store::short_id;

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive session with background autosave.
    Shell {
        /// Seconds between background saves.
        #[arg(long, default_value_t = DEFAULT_INTERVAL.as_secs())]
        autosave_secs: u64,
    },

    /// Show or update your profile.
    Profile {
        /// Display name.
        #[arg(long)]
        name: Option<String>,
        /// Avatar token (any short string or emoji).
        #[arg(long)]
        avatar: Option<String>,
        /// Theme token.
        #[arg(long)]
        theme: Option<String>,
        /// Remove the avatar.
        #[arg(long, conflicts_with = "avatar")]
        clear_avatar: bool,
        /// Remove the theme.
        #[arg(long, conflicts_with = "theme")]
        clear_theme: bool,
    },

    /// Create a new goal.
    New {
        /// Goal title.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// How long you give yourself, in --unit units.
        #[arg(long, allow_negative_numbers = true)]
        duration: i64,
        /// Duration unit: days | weeks | months | years.
        #[arg(long, value_enum, default_value_t = DurationUnit::Days)]
        unit: DurationUnit,
        /// End date: YYYY-MM-DD or a phrase like "end of year". Defaults to today + duration.
        #[arg(long)]
        end: Option<String>,
        /// Icon shown next to the goal.
        #[arg(long)]
        icon: Option<String>,
    },

    /// List goals with progress and time left.
    List,

    /// Show a goal with its periods and tasks.
    View {
        /// Goal id, id prefix, title or #position.
        goal: String,
    },

    /// Rename a goal.
    Rename {
        goal: String,
        title: String,
    },

    /// Delete a goal with all its periods and tasks.
    Rm {
        goal: String,
    },

    /// Manage the periods of a goal.
    Period {
        #[command(subcommand)]
        action: PeriodAction,
    },

    /// Manage the tasks of a period.
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Overall statistics.
    Stats,

    /// Show or choose the completion tone.
    Sound {
        #[arg(value_enum)]
        tone: Option<Tone>,
    },

    /// Export all data to a JSON file.
    Export {
        /// Output file path (default: goal-horizon-backup-<date>.json)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Replace all data with the contents of an exported file.
    Import {
        input: PathBuf,
        /// Do not ask for confirmation.
        #[arg(long)]
        yes: bool,
        /// Skip creating backup before import
        #[arg(long)]
        no_backup: bool,
    },

    /// Create timestamped backup of the data file.
    Backup,

    /// Delete everything, including your name and all goals.
    Reset {
        /// Do not ask for confirmation.
        #[arg(long)]
        yes: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum PeriodAction {
    /// Add a period to a goal.
    Add {
        goal: String,
        name: String,
        /// Optional deadline: YYYY-MM-DD or a phrase.
        #[arg(long)]
        end: Option<String>,
    },
    /// Rename a period.
    Rename {
        goal: String,
        period: String,
        name: String,
    },
    /// Set or clear a period's deadline.
    Deadline {
        goal: String,
        period: String,
        /// New deadline; omit to clear.
        end: Option<String>,
    },
    /// Delete a period with all its tasks.
    Rm {
        goal: String,
        period: String,
    },
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task to a period.
    Add {
        goal: String,
        period: String,
        text: String,
    },
    /// Mark a task done, or not done if it already was.
    Toggle {
        goal: String,
        period: String,
        task: String,
    },
    /// Change a task's text.
    Edit {
        goal: String,
        period: String,
        task: String,
        text: String,
    },
    /// Delete a task.
    Rm {
        goal: String,
        period: String,
        task: String,
    },
}

/// Whether a command changed the state and so needs saving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Unchanged,
    Mutated,
}

/// Per-invocation environment for handlers.
pub struct Context<'a> {
    pub db_path: &'a Path,
    pub now: NaiveDateTime,
    pub color: bool,
}

/// Ask a yes/no question on stdin. Anything but an explicit yes is a no.
pub fn confirm(out: &mut dyn Write, prompt: &str) -> GoalResult<bool> {
    write!(out, "{prompt} (y/N): ")?;
    out.flush()?;
    let mut response = String::new();
    if io::stdin().lock().read_line(&mut response).is_err() {
        return Ok(false);
    }
    Ok(response.trim().to_lowercase().starts_with('y'))
}

const IMPORT_PROMPT: &str = "This will replace all your current data. Continue?";

fn confirm_reset(out: &mut dyn Write) -> GoalResult<bool> {
    Ok(confirm(out, "Reset ALL data? This cannot be undone!")?
        && confirm(out, "Really? This deletes your name and all goals!")?)
}

/// Ask whatever a command needs confirmed before it runs, so a caller holding
/// the state lock never waits on the terminal. Returns the command with the
/// answer recorded, or `None` if the user declined.
pub fn confirm_upfront(command: Commands, out: &mut dyn Write) -> GoalResult<Option<Commands>> {
    match command {
        Commands::Reset { yes: false } => {
            if confirm_reset(out)? {
                Ok(Some(Commands::Reset { yes: true }))
            } else {
                writeln!(out, "Reset cancelled.")?;
                Ok(None)
            }
        }
        Commands::Import { input, yes: false, no_backup } => {
            // A bad file is reported before anything is asked.
            read_import(&input)?;
            if confirm(out, IMPORT_PROMPT)? {
                Ok(Some(Commands::Import { input, yes: true, no_backup }))
            } else {
                writeln!(out, "Import cancelled.")?;
                Ok(None)
            }
        }
        other => Ok(Some(other)),
    }
}

fn parse_date_arg(input: &str, ctx: &Context) -> GoalResult<chrono::NaiveDate> {
    parse_date_phrase(input, ctx.now.date())
        .ok_or_else(|| GoalError::validation(format!("could not understand date '{input}'")))
}

/// Apply one command to `state`, writing user-facing output to `out`.
pub fn execute(state: &mut AppState, command: Commands, ctx: &Context, out: &mut dyn Write) -> GoalResult<Effect> {
    match command {
        Commands::Shell { .. } => Err(GoalError::validation("already in an interactive session")),
        Commands::Profile { name, avatar, theme, clear_avatar, clear_theme } => {
            cmd_profile(state, name, avatar, theme, clear_avatar, clear_theme, out)
        }
        Commands::New { title, desc, duration, unit, end, icon } => {
            cmd_new(state, title, desc, duration, unit, end, icon, ctx, out)
        }
        Commands::List => {
            write!(out, "{}", render_goal_table(&state.goals, ctx.now, ctx.color))?;
            Ok(Effect::Unchanged)
        }
        Commands::View { goal } => {
            let id = state.goals.resolve_goal(&goal)?;
            if let Some(goal) = state.goals.goal(&id) {
                write!(out, "{}", render_goal_detail(goal, ctx.now, ctx.color))?;
            }
            Ok(Effect::Unchanged)
        }
        Commands::Rename { goal, title } => {
            let id = state.goals.resolve_goal(&goal)?;
            state.goals.rename_goal(&id, &title)?;
            writeln!(out, "Renamed goal {}", short_id(&id))?;
            Ok(Effect::Mutated)
        }
        Commands::Rm { goal } => {
            let id = state.goals.resolve_goal(&goal)?;
            let removed = state.goals.delete_goal(&id)?;
            let tasks: usize = removed.periods.iter().map(|p| p.tasks.len()).sum();
            writeln!(
                out,
                "Deleted goal '{}' ({} periods, {} tasks)",
                removed.title,
                removed.periods.len(),
                tasks
            )?;
            Ok(Effect::Mutated)
        }
        Commands::Period { action } => cmd_period(state, action, ctx, out),
        Commands::Task { action } => cmd_task(state, action, ctx, out),
        Commands::Stats => {
            write!(out, "{}", render_stats(&store_stats(&state.goals), &state.user_name))?;
            Ok(Effect::Unchanged)
        }
        Commands::Sound { tone } => match tone {
            Some(tone) => {
                state.settings.sound = tone;
                writeln!(out, "Completion tone set to {}", tone.name())?;
                Ok(Effect::Mutated)
            }
            None => {
                writeln!(out, "Completion tone: {}", state.settings.sound.name())?;
                Ok(Effect::Unchanged)
            }
        },
        Commands::Export { output } => {
            let path = output.unwrap_or_else(|| PathBuf::from(default_export_name(ctx.now.date())));
            export_to(state, &path)?;
            writeln!(out, "Exported {} goals to {}", state.goals.len(), path.display())?;
            Ok(Effect::Unchanged)
        }
        Commands::Import { input, yes, no_backup } => cmd_import(state, &input, yes, no_backup, ctx, out),
        Commands::Backup => {
            let backup = create_backup(ctx.db_path)?;
            writeln!(out, "Created backup: {}", backup.display())?;
            Ok(Effect::Unchanged)
        }
        Commands::Reset { yes } => {
            if !yes && !confirm_reset(out)? {
                writeln!(out, "Reset cancelled.")?;
                return Ok(Effect::Unchanged);
            }
            *state = AppState::default();
            writeln!(out, "All data reset.")?;
            Ok(Effect::Mutated)
        }
        Commands::Completions { shell } => {
            use clap::CommandFactory;
            use crate::cli::Cli;

            let mut app = Cli::command();
            let app_name = app.get_name().to_string();
            generate(shell, &mut app, app_name, out);
            Ok(Effect::Unchanged)
        }
    }
}

fn cmd_profile(
    state: &mut AppState,
    name: Option<String>,
    avatar: Option<String>,
    theme: Option<String>,
    clear_avatar: bool,
    clear_theme: bool,
    out: &mut dyn Write,
) -> GoalResult<Effect> {
    let changing = name.is_some() || avatar.is_some() || theme.is_some() || clear_avatar || clear_theme;
    if !changing {
        let name = if state.user_name.is_empty() { "(not set)" } else { state.user_name.as_str() };
        writeln!(out, "Name:   {name}")?;
        writeln!(out, "Avatar: {}", state.avatar.as_deref().unwrap_or("-"))?;
        writeln!(out, "Theme:  {}", state.theme.as_deref().unwrap_or("-"))?;
        return Ok(Effect::Unchanged);
    }

    // Validate before touching anything.
    let mut updated = state.clone();
    if let Some(name) = name {
        updated.set_user_name(&name)?;
    }
    let token = |t: String| Some(t.trim().to_string()).filter(|t| !t.is_empty());
    if let Some(avatar) = avatar {
        updated.avatar = token(avatar);
    }
    if let Some(theme) = theme {
        updated.theme = token(theme);
    }
    if clear_avatar {
        updated.avatar = None;
    }
    if clear_theme {
        updated.theme = None;
    }
    *state = updated;
    writeln!(out, "Profile updated.")?;
    Ok(Effect::Mutated)
}

#[allow(clippy::too_many_arguments)]
fn cmd_new(
    state: &mut AppState,
    title: String,
    desc: Option<String>,
    duration: i64,
    unit: DurationUnit,
    end: Option<String>,
    icon: Option<String>,
    ctx: &Context,
    out: &mut dyn Write,
) -> GoalResult<Effect> {
    let end_date = match end {
        Some(phrase) => Some(parse_date_arg(&phrase, ctx)?),
        None => u32::try_from(duration)
            .ok()
            .and_then(|d| end_date_from_duration(ctx.now.date(), d, unit)),
    };
    let id = state.goals.create_goal(NewGoal {
        title,
        description: desc,
        duration_value: duration,
        duration_unit: unit,
        end_date,
        icon,
    })?;
    if let Some(goal) = state.goals.goal(&id) {
        writeln!(
            out,
            "Created goal {} {} '{}', ends {}",
            short_id(&id),
            goal.icon,
            goal.title,
            goal.end_date.format("%Y-%m-%d")
        )?;
    }
    Ok(Effect::Mutated)
}

fn cmd_period(state: &mut AppState, action: PeriodAction, ctx: &Context, out: &mut dyn Write) -> GoalResult<Effect> {
    let goals = &mut state.goals;
    match action {
        PeriodAction::Add { goal, name, end } => {
            let goal_id = goals.resolve_goal(&goal)?;
            let end_date = end.map(|e| parse_date_arg(&e, ctx)).transpose()?;
            let id = goals.add_period(&goal_id, &name, end_date)?;
            writeln!(out, "Added period {} '{}'", short_id(&id), name.trim())?;
        }
        PeriodAction::Rename { goal, period, name } => {
            let goal_id = goals.resolve_goal(&goal)?;
            let period_id = goals.resolve_period(&goal_id, &period)?;
            goals.rename_period(&goal_id, &period_id, &name)?;
            writeln!(out, "Renamed period {}", short_id(&period_id))?;
        }
        PeriodAction::Deadline { goal, period, end } => {
            let goal_id = goals.resolve_goal(&goal)?;
            let period_id = goals.resolve_period(&goal_id, &period)?;
            let end_date = end.map(|e| parse_date_arg(&e, ctx)).transpose()?;
            goals.set_period_deadline(&goal_id, &period_id, end_date)?;
            match end_date {
                Some(date) => writeln!(out, "Deadline set to {}", date.format("%Y-%m-%d"))?,
                None => writeln!(out, "Deadline cleared")?,
            }
        }
        PeriodAction::Rm { goal, period } => {
            let goal_id = goals.resolve_goal(&goal)?;
            let period_id = goals.resolve_period(&goal_id, &period)?;
            let removed = goals.delete_period(&goal_id, &period_id)?;
            writeln!(out, "Deleted period '{}' ({} tasks)", removed.name, removed.tasks.len())?;
        }
    }
    Ok(Effect::Mutated)
}

fn cmd_task(state: &mut AppState, action: TaskAction, ctx: &Context, out: &mut dyn Write) -> GoalResult<Effect> {
    let tone = state.settings.sound;
    let goals = &mut state.goals;
    match action {
        TaskAction::Add { goal, period, text } => {
            let goal_id = goals.resolve_goal(&goal)?;
            let period_id = goals.resolve_period(&goal_id, &period)?;
            let id = goals.add_task(&goal_id, &period_id, &text)?;
            writeln!(out, "Added task {}", short_id(&id))?;
        }
        TaskAction::Toggle { goal, period, task } => {
            let goal_id = goals.resolve_goal(&goal)?;
            let period_id = goals.resolve_period(&goal_id, &period)?;
            let task_id = goals.resolve_task(&goal_id, &period_id, &task)?;
            let toggle = goals.toggle_task(&goal_id, &period_id, &task_id)?;

            if toggle.became_completed {
                let bell = if ctx.color { "\x07" } else { "" };
                writeln!(out, "{bell}✔ Task completed! ({} tone)", tone.name())?;
            } else {
                writeln!(out, "Task reopened.")?;
            }
            if let (Some(goal), Some(period)) = (goals.goal(&goal_id), goals.period(&goal_id, &period_id)) {
                writeln!(
                    out,
                    "  {}: {}%   {}: {}%",
                    period.name,
                    percent(period_totals(period)),
                    goal.title,
                    progress_percent(goal)
                )?;
            }
        }
        TaskAction::Edit { goal, period, task, text } => {
            let goal_id = goals.resolve_goal(&goal)?;
            let period_id = goals.resolve_period(&goal_id, &period)?;
            let task_id = goals.resolve_task(&goal_id, &period_id, &task)?;
            goals.edit_task(&goal_id, &period_id, &task_id, &text)?;
            writeln!(out, "Updated task {}", short_id(&task_id))?;
        }
        TaskAction::Rm { goal, period, task } => {
            let goal_id = goals.resolve_goal(&goal)?;
            let period_id = goals.resolve_period(&goal_id, &period)?;
            let task_id = goals.resolve_task(&goal_id, &period_id, &task)?;
            let removed = goals.delete_task(&goal_id, &period_id, &task_id)?;
            writeln!(out, "Deleted task '{}'", removed.text)?;
        }
    }
    Ok(Effect::Mutated)
}

fn cmd_import(
    state: &mut AppState,
    input: &Path,
    yes: bool,
    no_backup: bool,
    ctx: &Context,
    out: &mut dyn Write,
) -> GoalResult<Effect> {
    // Parse first: a bad file must not cost a backup or a prompt.
    let imported = read_import(input)?;

    if !yes && !confirm(out, IMPORT_PROMPT)? {
        writeln!(out, "Import cancelled.")?;
        return Ok(Effect::Unchanged);
    }

    if !no_backup && ctx.db_path.exists() {
        match create_backup(ctx.db_path) {
            Ok(backup) => writeln!(out, "Created backup: {}", backup.display())?,
            Err(e) => {
                warn!("backup before import failed: {e}");
                if yes || !confirm(out, &format!("Backup failed ({e}). Continue without backup?"))? {
                    writeln!(out, "Import cancelled.")?;
                    return Ok(Effect::Unchanged);
                }
            }
        }
    }

    *state = imported;
    writeln!(out, "Imported {} goals.", state.goals.len())?;
    Ok(Effect::Mutated)
}
