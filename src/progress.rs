//! Derived progress values: totals, percentages, status bands and countdowns.
//!
//! Everything here is a pure function of entity state and an explicit "now";
//! nothing reads the clock or caches results.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::fields::StatusBand;
use crate::goal::{Goal, Period};
use crate::store::GoalStore;

/// Label shown once a countdown has run out.
pub const COMPLETED_LABEL: &str = "Completed!";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskTotals {
    pub total: usize,
    pub completed: usize,
}

impl std::ops::Add for TaskTotals {
    type Output = TaskTotals;

    fn add(self, rhs: TaskTotals) -> TaskTotals {
        TaskTotals {
            total: self.total + rhs.total,
            completed: self.completed + rhs.completed,
        }
    }
}

pub fn period_totals(period: &Period) -> TaskTotals {
    TaskTotals {
        total: period.tasks.len(),
        completed: period.tasks.iter().filter(|t| t.completed).count(),
    }
}

/// Task counts summed across every period of `goal`.
pub fn task_totals(goal: &Goal) -> TaskTotals {
    goal.periods
        .iter()
        .map(period_totals)
        .fold(TaskTotals::default(), |acc, t| acc + t)
}

/// `completed / total` as a whole percentage, rounding halves up. Zero when
/// there is nothing to complete.
pub fn percent(totals: TaskTotals) -> u8 {
    if totals.total == 0 {
        return 0;
    }
    let rounded = (200 * totals.completed + totals.total) / (2 * totals.total);
    rounded.min(100) as u8
}

pub fn progress_percent(goal: &Goal) -> u8 {
    percent(task_totals(goal))
}

pub fn status_band(percent: u8) -> StatusBand {
    match percent {
        0 => StatusBand::Idle,
        1..=24 => StatusBand::Low,
        25..=49 => StatusBand::Mid,
        50..=74 => StatusBand::High,
        _ => StatusBand::Top,
    }
}

/// Remaining time until a target, split into whole days, hours and minutes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    pub label: String,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

impl Countdown {
    pub fn is_finished(&self) -> bool {
        self.label == COMPLETED_LABEL
    }
}

fn plural(value: i64, unit: &str) -> String {
    if value == 1 {
        format!("{value} {unit}")
    } else {
        format!("{value} {unit}s")
    }
}

pub fn countdown(target: NaiveDateTime, now: NaiveDateTime) -> Countdown {
    if target <= now {
        return Countdown {
            label: COMPLETED_LABEL.to_string(),
            days: 0,
            hours: 0,
            minutes: 0,
        };
    }

    let total_minutes = (target - now).num_minutes();
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes % (24 * 60)) / 60;
    let minutes = total_minutes % 60;

    let label = if days > 0 {
        plural(days, "day")
    } else if hours > 0 {
        plural(hours, "hour")
    } else {
        plural(minutes, "min")
    };

    Countdown { label, days, hours, minutes }
}

/// A calendar deadline runs out at the start of that day.
pub fn deadline(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Totals across the whole store, as shown on the stats screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub goals: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub completion_rate: u8,
}

pub fn store_stats(store: &GoalStore) -> StoreStats {
    let totals = store
        .goals()
        .iter()
        .map(task_totals)
        .fold(TaskTotals::default(), |acc, t| acc + t);
    StoreStats {
        goals: store.len(),
        total_tasks: totals.total,
        completed_tasks: totals.completed,
        completion_rate: percent(totals),
    }
}
