//! Goal, period and task records.
//!
//! These are the three levels of the ownership tree: a `Goal` owns its
//! `Period`s, and a `Period` owns its `Task`s. Nothing is shared between
//! branches, so dropping a node drops its whole subtree. Constructors validate
//! their input; the store only ever inserts values built through them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{GoalError, GoalResult};
use crate::fields::DurationUnit;

/// Marker used when a goal is created without an icon.
pub const DEFAULT_ICON: &str = "🎯";

/// Fresh collision-resistant identity.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_icon() -> String {
    DEFAULT_ICON.to_string()
}

/// Trim `input`, rejecting it when nothing is left.
fn required(input: &str, what: &str) -> GoalResult<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(GoalError::validation(format!("{what} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// A single checklist item within a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    // Older exports carry tasks without ids; those get one on load.
    #[serde(default = "new_id")]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(text: &str) -> GoalResult<Self> {
        Ok(Task {
            id: new_id(),
            text: required(text, "task text")?,
            completed: false,
            created_at: Utc::now(),
        })
    }
}

/// A named subdivision of a goal with an optional deadline of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Period {
    pub fn new(name: &str, end_date: Option<NaiveDate>) -> GoalResult<Self> {
        Ok(Period {
            id: new_id(),
            name: required(name, "period name")?,
            end_date,
            tasks: Vec::new(),
        })
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }
}

/// Input for creating a goal. `duration_value` is signed so that zero and
/// negative values can be rejected rather than silently clamped.
#[derive(Debug, Clone, Default)]
pub struct NewGoal {
    pub title: String,
    pub description: Option<String>,
    pub duration_value: i64,
    pub duration_unit: DurationUnit,
    pub end_date: Option<NaiveDate>,
    pub icon: Option<String>,
}

/// Top-level tracked objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub duration: u32,
    pub unit: DurationUnit,
    pub end_date: NaiveDate,
    #[serde(default = "default_icon")]
    pub icon: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub periods: Vec<Period>,
}

impl Goal {
    pub fn new(input: NewGoal) -> GoalResult<Self> {
        let title = required(&input.title, "goal title")?;
        let duration = u32::try_from(input.duration_value)
            .ok()
            .filter(|d| *d > 0)
            .ok_or_else(|| {
                GoalError::validation(format!(
                    "duration must be a positive whole number, got {}",
                    input.duration_value
                ))
            })?;
        let end_date = input
            .end_date
            .ok_or_else(|| GoalError::validation("an end date is required"))?;

        let description = input
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        let icon = input
            .icon
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .unwrap_or_else(default_icon);

        Ok(Goal {
            id: new_id(),
            title,
            description,
            duration,
            unit: input.duration_unit,
            end_date,
            icon,
            created_at: Utc::now(),
            periods: Vec::new(),
        })
    }

    pub fn period(&self, period_id: &str) -> Option<&Period> {
        self.periods.iter().find(|p| p.id == period_id)
    }

    pub fn period_mut(&mut self, period_id: &str) -> Option<&mut Period> {
        self.periods.iter_mut().find(|p| p.id == period_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_goal(title: &str, duration: i64) -> NewGoal {
        NewGoal {
            title: title.to_string(),
            duration_value: duration,
            end_date: NaiveDate::from_ymd_opt(2030, 1, 1),
            ..NewGoal::default()
        }
    }

    #[test]
    fn goal_defaults_icon_and_drops_blank_description() {
        let mut input = new_goal("  Run a marathon ", 6);
        input.description = Some("   ".into());
        input.icon = None;
        let goal = Goal::new(input).unwrap();
        assert_eq!(goal.title, "Run a marathon");
        assert_eq!(goal.icon, DEFAULT_ICON);
        assert_eq!(goal.description, None);
        assert!(goal.periods.is_empty());
    }

    #[test]
    fn goal_rejects_non_positive_duration() {
        assert!(matches!(Goal::new(new_goal("Read", 0)), Err(GoalError::Validation(_))));
        assert!(matches!(Goal::new(new_goal("Read", -3)), Err(GoalError::Validation(_))));
    }

    #[test]
    fn goal_requires_end_date() {
        let mut input = new_goal("Read", 2);
        input.end_date = None;
        assert!(matches!(Goal::new(input), Err(GoalError::Validation(_))));
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(Period::new(" \t", None).is_err());
        assert!(Task::new("").is_err());
        let task = Task::new(" Draft outline ").unwrap();
        assert_eq!(task.text, "Draft outline");
        assert!(!task.completed);
    }

    #[test]
    fn ids_are_unique_under_rapid_creation() {
        let ids: std::collections::HashSet<String> = (0..1000).map(|_| new_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn task_without_id_gets_one_on_load() {
        let json = r#"{"text":"Stretch","completed":true,"createdAt":"2024-03-01T08:00:00.000Z"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert!(!task.id.is_empty());
        assert!(task.completed);
    }
}
