//! Data models for the persisted records.
//!
//! - `DayEntry`, `DayPatch`, `Days`: one record per logical day
//! - `Settings`, `SettingsPatch`, `Features`, `Theme`: the single settings object
//!
//! Both records are decoded leniently so that a bad field never discards
//! the rest of the record.

pub mod day;
mod lenient;
pub mod settings;

pub use day::{decode_days, DayEntry, DayField, DayPatch, Days};
pub use settings::{Feature, Features, Settings, SettingsPatch, Theme};
