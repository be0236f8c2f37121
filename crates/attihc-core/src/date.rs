//! Logical-day and streak arithmetic.
//!
//! A logical day starts at the configured reset hour instead of midnight,
//! so late-night edits still count toward the previous day. Everything
//! here is pure; the current time is always passed in.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::models::Days;

/// Format of day keys: zero-padded `YYYY-MM-DD`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_FORMAT).ok()
}

/// The logical day that local wall-clock time `now` belongs to.
///
/// Before `reset_hour` the moment still belongs to yesterday. A reset
/// hour of 0 always yields the calendar date.
pub fn logical_date(reset_hour: u8, now: NaiveDateTime) -> NaiveDate {
    let today = now.date();
    if now.hour() < u32::from(reset_hour) {
        today.pred_opt().unwrap_or(today)
    } else {
        today
    }
}

/// [`logical_date`] as a day key.
pub fn logical_date_for(reset_hour: u8, now: NaiveDateTime) -> String {
    date_key(logical_date(reset_hour, now))
}

/// The calendar day before `key`, or `None` if `key` is not a date.
pub fn previous_day(key: &str) -> Option<String> {
    parse_date_key(key)
        .and_then(|d| d.pred_opt())
        .map(date_key)
}

fn has_content(days: &Days, key: &str) -> bool {
    days.get(key).is_some_and(|e| e.has_content())
}

/// Number of consecutive days ending at `today_key` that have content.
///
/// Zero when today itself is empty or missing, whatever came before.
pub fn streak(days: &Days, today_key: &str) -> u32 {
    let mut seen = HashSet::new();
    let mut count = 0;
    let mut cursor = Some(today_key.to_string());

    while let Some(key) = cursor {
        if !has_content(days, &key) || !seen.insert(key.clone()) {
            break;
        }
        count += 1;
        cursor = previous_day(&key);
    }
    count
}

/// One cell of the activity strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatCell {
    pub date: String,
    pub active: bool,
}

/// `span` days ending at `today`, oldest first, marking which have content.
pub fn heat(days: &Days, today: NaiveDate, span: usize) -> Vec<HeatCell> {
    (0..span)
        .rev()
        .filter_map(|offset| today.checked_sub_signed(Duration::days(offset as i64)))
        .map(|date| {
            let key = date_key(date);
            HeatCell {
                active: has_content(days, &key),
                date: key,
            }
        })
        .collect()
}
