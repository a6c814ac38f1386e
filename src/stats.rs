use crate::entry_log::LogEntry;
use crate::errors::TrackerError;
use crate::models::WeightEntry;
use chrono::{Duration, Local, NaiveDate};
use serde::Serialize;

pub const MAX_WINDOW_DAYS: usize = 366;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayBucket {
    pub date: String,
    pub label: String,
    pub total: u64,
}

pub fn bucket_by_day<T: LogEntry>(
    entries: &[T],
    window_days: usize,
    suppress_labels: bool,
) -> Result<Vec<DayBucket>, TrackerError> {
    bucket_by_day_at(today(), entries, window_days, suppress_labels)
}

/// Sums entries into `window_days` calendar days ending at `today`, oldest
/// first. Days without entries are zero.
pub fn bucket_by_day_at<T: LogEntry>(
    today: NaiveDate,
    entries: &[T],
    window_days: usize,
    suppress_labels: bool,
) -> Result<Vec<DayBucket>, TrackerError> {
    if window_days == 0 || window_days > MAX_WINDOW_DAYS {
        return Err(TrackerError::InvalidWindow(window_days));
    }

    let mut buckets = Vec::with_capacity(window_days);
    for offset in (0..window_days).rev() {
        let date = today - Duration::days(offset as i64);
        let total = entries
            .iter()
            .filter(|entry| entry.occurred_at().date_naive() == date)
            .fold(0u64, |sum, entry| sum.saturating_add(entry.amount()));

        let label = if suppress_labels {
            String::new()
        } else {
            day_label(date, window_days)
        };

        buckets.push(DayBucket {
            date: date_key(date),
            label,
            total,
        });
    }

    Ok(buckets)
}

pub fn total_for_today<T: LogEntry>(entries: &[T]) -> u64 {
    total_for_day(today(), entries)
}

pub fn total_for_day<T: LogEntry>(day: NaiveDate, entries: &[T]) -> u64 {
    entries
        .iter()
        .filter(|entry| entry.occurred_at().date_naive() == day)
        .fold(0u64, |sum, entry| sum.saturating_add(entry.amount()))
}

/// Weight entries dated within the six days before `today` or on it.
pub fn last_seven_days(entries: &[WeightEntry], today: NaiveDate) -> Vec<WeightEntry> {
    let start = today - Duration::days(6);
    let mut recent: Vec<WeightEntry> = entries
        .iter()
        .filter(|entry| entry.date >= start && entry.date <= today)
        .cloned()
        .collect();
    recent.sort_by(|a, b| a.date.cmp(&b.date));
    recent
}

/// Last minus first weight over the past week; absent below two readings.
pub fn weekly_change(entries: &[WeightEntry], today: NaiveDate) -> Option<f64> {
    let recent = last_seven_days(entries, today);
    if recent.len() < 2 {
        return None;
    }
    let first = recent.first()?.weight;
    let last = recent.last()?.weight;
    Some(last - first)
}

pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn day_label(date: NaiveDate, window_days: usize) -> String {
    if window_days <= 7 {
        date.format("%a").to_string()
    } else {
        date.format("%b %-d").to_string()
    }
}
