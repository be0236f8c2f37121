//! Core library for attihc, a local-first daily planner.
//!
//! Each day the user records what they must remember, complete and avoid,
//! plus a focus word and a scratchpad. This crate keeps those entries and
//! the user's settings in a session cache (`Store`) backed by a local
//! key-value store, and derives history, streaks and insights from them.
//!
//! - `models`: `DayEntry`, `Settings` and their patches
//! - `storage`: the `LocalStore` adapter and key-value backends
//! - `store`: the session cache with subscribers and debounced writes
//! - `date`: logical-day and streak arithmetic
//! - `theme`, `history`, `insights`: derived views

pub mod clock;
pub mod config;
pub mod date;
pub mod debounce;
pub mod history;
pub mod insights;
pub mod models;
pub mod storage;
pub mod store;
pub mod theme;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use history::HistoryFilter;
pub use insights::Insights;
pub use models::{DayEntry, DayField, DayPatch, Days, Feature, Features, Settings, SettingsPatch, Theme};
pub use storage::{FileBackend, ImportError, KeyValueBackend, LocalStore, MemoryBackend, StorageError};
pub use store::{Snapshot, Store, StoreOptions, SubscriberId};
pub use theme::Appearance;
