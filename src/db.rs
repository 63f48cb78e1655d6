//! Persisted document and the gateways that store it.
//!
//! The whole application state is one JSON document: profile fields, the goal
//! collection and settings. It is always written and read as a unit; there is
//! no partial update on disk.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{GoalError, GoalResult};
use crate::fields::Tone;
use crate::store::GoalStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub sound: Tone,
}

/// Everything the tool persists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub goals: GoalStore,
    #[serde(default)]
    pub settings: Settings,
}

impl AppState {
    pub fn to_json(&self) -> GoalResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a user-supplied document. Anything that is not a well-formed
    /// state document is a validation error, not a storage one.
    pub fn from_json(data: &str) -> GoalResult<Self> {
        let state: AppState = serde_json::from_str(data)
            .map_err(|e| GoalError::validation(format!("not a valid goal document: {e}")))?;
        state.validate()?;
        Ok(state)
    }

    /// Check the invariants the goal store keeps for documents that were
    /// edited or produced outside this tool.
    pub fn validate(&self) -> GoalResult<()> {
        self.goals.validate()
    }

    pub fn set_user_name(&mut self, name: &str) -> GoalResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GoalError::validation("name cannot be empty"));
        }
        self.user_name = name.to_string();
        Ok(())
    }
}

/// Load/save of the whole state document.
pub trait PersistenceGateway: Send + Sync {
    /// Persist a full snapshot.
    fn save(&self, state: &AppState) -> GoalResult<()>;

    /// Previously saved state, or `None` when nothing usable is stored.
    fn load(&self) -> Option<AppState>;
}

/// Stores the document as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileGateway {
    path: PathBuf,
}

impl JsonFileGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileGateway { path: path.into() }
    }
}

impl PersistenceGateway for JsonFileGateway {
    fn save(&self, state: &AppState) -> GoalResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        // Atomic-ish write via temp + rename.
        let tmp = self.path.with_extension("json.tmp");
        let data = state.to_json()?;
        let mut f = File::create(&tmp)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(&tmp, &self.path)?;
        info!(path = %self.path.display(), goals = state.goals.len(), "state saved");
        Ok(())
    }

    fn load(&self) -> Option<AppState> {
        if !self.path.exists() {
            return None;
        }
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) => {
                warn!(path = %self.path.display(), "error reading state, starting fresh: {e}");
                return None;
            }
        };
        match AppState::from_json(&data) {
            Ok(state) => {
                info!(path = %self.path.display(), goals = state.goals.len(), "state loaded");
                Some(state)
            }
            Err(e) => {
                warn!(path = %self.path.display(), "error parsing state, starting fresh: {e}");
                None
            }
        }
    }
}

/// Load the stored state, or start fresh. A data file that exists but cannot
/// be used is copied into `backup/` first, so the next save does not destroy
/// it. The flag tells whether the state came from the data file.
pub fn load_or_preserve(gateway: &dyn PersistenceGateway, db_path: &Path) -> (AppState, bool) {
    if let Some(state) = gateway.load() {
        return (state, true);
    }
    if db_path.exists() {
        match create_backup(db_path) {
            Ok(backup) => warn!(backup = %backup.display(), "unreadable data file kept as a backup"),
            Err(e) => warn!(path = %db_path.display(), "could not back up unreadable data file: {e}"),
        }
    }
    (AppState::default(), false)
}

/// Suggested file name for an export taken on `today`.
pub fn default_export_name(today: NaiveDate) -> String {
    format!("goal-horizon-backup-{}.json", today.format("%Y-%m-%d"))
}

/// Write the full document to `path`.
pub fn export_to(state: &AppState, path: &Path) -> GoalResult<()> {
    fs::write(path, state.to_json()?)?;
    Ok(())
}

/// Read and validate a document for import. The caller decides whether to
/// replace its state with it.
pub fn read_import(path: &Path) -> GoalResult<AppState> {
    let data = fs::read_to_string(path)?;
    AppState::from_json(&data)
}

/// Copy the data file into a `backup/` directory next to it, stamped with the
/// local time. Returns the backup path.
pub fn create_backup(db_path: &Path) -> GoalResult<PathBuf> {
    if !db_path.exists() {
        return Err(GoalError::not_found(format!("data file {}", db_path.display())));
    }

    let parent_dir = db_path.parent().unwrap_or_else(|| Path::new("."));
    let backup_dir = parent_dir.join("backup");
    fs::create_dir_all(&backup_dir)?;

    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let file_name = db_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("state.json");
    let backup_path = backup_dir.join(format!("{timestamp}_{file_name}"));

    fs::copy(db_path, &backup_path)?;
    info!(backup = %backup_path.display(), "backup created");
    Ok(backup_path)
}
