//! Text rendering of goals, periods and tasks for the terminal.
//!
//! Renderers return strings so command handlers decide where output goes.
//! Colour is applied only when the caller asks for it.

use std::fmt::Write as _;

use chrono::NaiveDateTime;
use crossterm::style::Stylize;

use crate::colors::band_color;
use crate::goal::{Goal, Period};
use crate::progress::{countdown, deadline, percent, period_totals, progress_percent, status_band, task_totals, StoreStats};
use crate::store::{short_id, GoalStore};

const BAR_WIDTH: usize = 20;

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

pub fn progress_bar(percent: u8, width: usize) -> String {
    let filled = (percent as usize * width + 50) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled.min(width)))
}

fn paint(text: String, percent: u8, color: bool) -> String {
    if color {
        text.with(band_color(status_band(percent))).to_string()
    } else {
        text
    }
}

/// "12 days left", or the terminal label once the date has passed.
pub fn remaining(date: chrono::NaiveDate, now: NaiveDateTime) -> String {
    let c = countdown(deadline(date), now);
    if c.is_finished() {
        c.label
    } else {
        format!("{} left", c.label)
    }
}

pub fn render_goal_table(store: &GoalStore, now: NaiveDateTime, color: bool) -> String {
    if store.is_empty() {
        return "No goals yet. Create one with `horizon new <title>`.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<9} {:<2} {:<28} {:<27} {:<9} {}",
        "ID", "", "Title", "Progress", "Tasks", "Deadline"
    );
    for goal in store.goals() {
        let totals = task_totals(goal);
        let pct = progress_percent(goal);
        let progress = format!("{} {:>3}%", progress_bar(pct, BAR_WIDTH), pct);
        let _ = writeln!(
            out,
            "{:<9} {:<2} {:<28} {} {:<9} {}",
            short_id(&goal.id),
            goal.icon,
            truncate(&goal.title, 28),
            paint(format!("{progress:<27}"), pct, color),
            format!("{}/{}", totals.completed, totals.total),
            remaining(goal.end_date, now),
        );
    }
    out
}

fn render_period(out: &mut String, index: usize, period: &Period, now: NaiveDateTime, color: bool) {
    let totals = period_totals(period);
    let pct = percent(totals);
    let _ = write!(
        out,
        "\n  #{} {}  {}  {}  {}/{} tasks ({}%)",
        index + 1,
        short_id(&period.id),
        period.name,
        paint(progress_bar(pct, 10), pct, color),
        totals.completed,
        totals.total,
        pct,
    );
    if let Some(end) = period.end_date {
        let _ = write!(out, "  ⏱ {}", remaining(end, now));
    }
    out.push('\n');

    if period.tasks.is_empty() {
        out.push_str("      (no tasks yet)\n");
    }
    for (i, task) in period.tasks.iter().enumerate() {
        let mark = if task.completed { "[x]" } else { "[ ]" };
        let _ = writeln!(out, "      {} #{} {}  {}", mark, i + 1, short_id(&task.id), task.text);
    }
}

pub fn render_goal_detail(goal: &Goal, now: NaiveDateTime, color: bool) -> String {
    let totals = task_totals(goal);
    let pct = progress_percent(goal);
    let c = countdown(deadline(goal.end_date), now);

    let mut out = String::new();
    let _ = writeln!(out, "{} {}  ({})", goal.icon, goal.title, short_id(&goal.id));
    if let Some(desc) = &goal.description {
        let _ = writeln!(out, "   {desc}");
    }
    let _ = writeln!(
        out,
        "   Planned for {} {}, ends {}",
        goal.duration,
        goal.unit.label(goal.duration),
        goal.end_date.format("%Y-%m-%d")
    );
    if c.is_finished() {
        let _ = writeln!(out, "   {}", c.label);
    } else {
        let _ = writeln!(out, "   {} days  {} hours  {} minutes left", c.days, c.hours, c.minutes);
    }
    let _ = writeln!(
        out,
        "   {} {}% ({})  {}/{} tasks",
        paint(progress_bar(pct, BAR_WIDTH), pct, color),
        pct,
        status_band(pct).name(),
        totals.completed,
        totals.total
    );

    if goal.periods.is_empty() {
        out.push_str("\n  No periods yet. Add one with `horizon period add`.\n");
    }
    for (i, period) in goal.periods.iter().enumerate() {
        render_period(&mut out, i, period, now, color);
    }
    out
}

pub fn render_stats(stats: &StoreStats, user_name: &str) -> String {
    let name = if user_name.is_empty() { "there" } else { user_name };
    format!(
        "Hi {name}!\n  Goals:           {}\n  Tasks completed: {}/{}\n  Completion rate: {}%\n",
        stats.goals, stats.completed_tasks, stats.total_tasks, stats.completion_rate
    )
}
