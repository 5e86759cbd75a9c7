//! Period label generation
//!
//! Produces the canonical column set for a report, independent of any query
//! result. Every function takes the reference date explicitly; nothing here
//! reads the clock.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;

fn month_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").ok())
        .as_ref()
}

fn day_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").ok())
        .as_ref()
}

/// Format a month label (`YYYY-MM`)
pub fn month_label(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}

/// Format a day label (`YYYY-MM-DD`)
pub fn day_label(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Month labels from `start_year-01` through `today`'s month, inclusive
pub fn monthly_labels(start_year: i32, today: NaiveDate) -> Vec<String> {
    let mut labels = Vec::new();
    for year in start_year..=today.year() {
        let end_month = if year < today.year() { 12 } else { today.month() };
        for month in 1..=end_month {
            labels.push(month_label(year, month));
        }
    }
    labels
}

/// Day labels from `start` through `end`, inclusive. Empty when `start > end`.
pub fn daily_labels(start: NaiveDate, end: NaiveDate) -> Vec<String> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(day_label)
        .collect()
}

/// Latest date a daily report may end on
pub fn yesterday(today: NaiveDate) -> NaiveDate {
    today - Duration::days(1)
}

/// Year of a month or day label
pub fn label_year(label: &str) -> Option<i32> {
    label.get(..4)?.parse().ok()
}

/// Sorted distinct years present in a label set
pub fn years_of(labels: &[String]) -> Vec<i32> {
    labels
        .iter()
        .filter_map(|l| label_year(l))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Labels whose year is in `years`; all labels when `years` is empty
pub fn filter_by_years(labels: &[String], years: &[i32]) -> Vec<String> {
    if years.is_empty() {
        return labels.to_vec();
    }
    labels
        .iter()
        .filter(|l| label_year(l).is_some_and(|y| years.contains(&y)))
        .cloned()
        .collect()
}

/// Whether `label` is a well-formed `YYYY-MM`
pub fn is_month_label(label: &str) -> bool {
    month_pattern().is_some_and(|re| re.is_match(label))
}

/// Whether `label` is a well-formed calendar date `YYYY-MM-DD`
pub fn is_day_label(label: &str) -> bool {
    day_pattern().is_some_and(|re| re.is_match(label))
        && NaiveDate::parse_from_str(label, "%Y-%m-%d").is_ok()
}

/// Ordinal of a month or day label; consecutive labels differ by one
fn label_ordinal(label: &str) -> Option<i64> {
    if is_month_label(label) {
        let year: i64 = label.get(..4)?.parse().ok()?;
        let month: i64 = label.get(5..7)?.parse().ok()?;
        Some(year * 12 + month - 1)
    } else if is_day_label(label) {
        NaiveDate::parse_from_str(label, "%Y-%m-%d")
            .ok()
            .map(|d| i64::from(d.num_days_from_ce()))
    } else {
        None
    }
}

/// Whether sorted labels form one unbroken run of months or days
pub fn is_contiguous(labels: &[String]) -> bool {
    let ordinals: Option<Vec<i64>> = labels.iter().map(|l| label_ordinal(l)).collect();
    ordinals.is_some_and(|o| o.windows(2).all(|w| w[1] == w[0] + 1))
}
