//! Date helpers for the command line.
//!
//! `end_date_from_duration` seeds a goal's end date from its duration when the
//! user gives none. `parse_date_phrase` turns loose input such as "in 3 weeks",
//! "next friday" or "end of month" into a date. Both take `today` explicitly;
//! the store never calls into this module.

use chrono::{Datelike, Duration, Months, NaiveDate};

use crate::fields::DurationUnit;

/// Date `value` units after `today`. Month and year steps clamp to the end of
/// a shorter month (Jan 31 + 1 month = Feb 28/29).
pub fn end_date_from_duration(today: NaiveDate, value: u32, unit: DurationUnit) -> Option<NaiveDate> {
    match unit {
        DurationUnit::Days => today.checked_add_signed(Duration::days(value as i64)),
        DurationUnit::Weeks => today.checked_add_signed(Duration::weeks(value as i64)),
        DurationUnit::Months => today.checked_add_months(Months::new(value)),
        DurationUnit::Years => today.checked_add_months(Months::new(value.checked_mul(12)?)),
    }
}

fn parse_unit(s: &str) -> Option<DurationUnit> {
    match s {
        "d" | "day" | "days" => Some(DurationUnit::Days),
        "w" | "wk" | "week" | "weeks" => Some(DurationUnit::Weeks),
        "m" | "mo" | "month" | "months" => Some(DurationUnit::Months),
        "y" | "yr" | "year" | "years" => Some(DurationUnit::Years),
        _ => None,
    }
}

/// Parse "3 weeks", "3w", "a month" into a count and unit.
fn parse_span(s: &str) -> Option<(u32, DurationUnit)> {
    let s = s.trim();
    if let Some((count, unit)) = s.split_once(char::is_whitespace) {
        let count = match count {
            "a" | "an" | "one" => 1,
            n => n.parse().ok()?,
        };
        return Some((count, parse_unit(unit.trim())?));
    }
    let split = s.find(|c: char| !c.is_ascii_digit())?;
    let (count, unit) = s.split_at(split);
    Some((count.parse().ok()?, parse_unit(unit)?))
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

fn weekday_index(s: &str) -> Option<u32> {
    let days = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    days.iter().find(|(name, _)| *name == s).map(|(_, idx)| *idx)
}

/// Interpret a free-text date phrase relative to `today`.
///
/// Supports:
/// - "today", "tomorrow"
/// - "end of week" / "eow", "end of month" / "eom", "end of year" / "eoy"
/// - "next week", "next month", "next year"
/// - weekday names, optionally prefixed with "this" or "next"
/// - "in 3 days", "in 2w", "6 months", "a year"
/// - "YYYY-MM-DD"
pub fn parse_date_phrase(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = input.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return today.succ_opt(),
        "end of week" | "eow" => {
            let weekday = today.weekday().num_days_from_monday() as i64;
            return Some(today + Duration::days(6 - weekday));
        }
        "end of month" | "eom" => return last_day_of_month(today.year(), today.month()),
        "end of year" | "eoy" => return NaiveDate::from_ymd_opt(today.year(), 12, 31),
        "next week" => return end_date_from_duration(today, 1, DurationUnit::Weeks),
        "next month" => return end_date_from_duration(today, 1, DurationUnit::Months),
        "next year" => return end_date_from_duration(today, 1, DurationUnit::Years),
        _ => {}
    }

    let (next, day) = if let Some(rest) = s.strip_prefix("next ") {
        (true, rest)
    } else if let Some(rest) = s.strip_prefix("this ") {
        (false, rest)
    } else {
        (false, s.as_str())
    };
    if let Some(target) = weekday_index(day) {
        let current = today.weekday().num_days_from_monday();
        let ahead = (target + 7 - current) % 7;
        let ahead = if next { ahead + 7 } else { ahead };
        return Some(today + Duration::days(ahead as i64));
    }

    let span = s.strip_prefix("in ").unwrap_or(&s);
    if let Some((count, unit)) = parse_span(span) {
        return end_date_from_duration(today, count, unit);
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}
