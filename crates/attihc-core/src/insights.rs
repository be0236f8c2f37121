//! Aggregate statistics over all entries.

use chrono::{Datelike, TimeZone, Timelike};
use serde::Serialize;

use crate::models::Days;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub total_entries: usize,
    pub total_words: usize,
    /// Rounded mean words per entry; zero with no entries.
    pub avg_words: usize,
    /// Entries by weekday of creation, Sunday first.
    pub day_of_week_counts: [u32; 7],
    /// Entries by hour of creation.
    pub hour_counts: [u32; 24],
}

impl Insights {
    /// Compute over `days`, bucketing creation times in `tz`.
    pub fn compute<Tz: TimeZone>(days: &Days, tz: &Tz) -> Self {
        let mut stats = Insights {
            total_entries: days.len(),
            ..Insights::default()
        };

        for entry in days.values() {
            stats.total_words += entry.word_count();

            if let Some(created) = tz.timestamp_millis_opt(entry.created_at()).single() {
                let weekday = created.weekday().num_days_from_sunday() as usize;
                stats.day_of_week_counts[weekday] += 1;
                stats.hour_counts[created.hour() as usize] += 1;
            }
        }

        if stats.total_entries > 0 {
            let avg = stats.total_words as f64 / stats.total_entries as f64;
            stats.avg_words = avg.round() as usize;
        }
        stats
    }

    /// Index of the busiest weekday (Sunday = 0), if any entries exist.
    pub fn busiest_weekday(&self) -> Option<usize> {
        busiest(&self.day_of_week_counts)
    }

    /// The busiest hour of day, if any entries exist.
    pub fn busiest_hour(&self) -> Option<usize> {
        busiest(&self.hour_counts)
    }
}

fn busiest(counts: &[u32]) -> Option<usize> {
    counts
        .iter()
        .enumerate()
        .filter(|(_, c)| **c > 0)
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
        .map(|(i, _)| i)
}

pub const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
