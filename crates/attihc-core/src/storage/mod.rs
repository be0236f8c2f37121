//! Local persistence for settings and day entries.
//!
//! This module provides the `LocalStore` adapter over a pluggable
//! `KeyValueBackend`. Two records are kept, each as JSON text under a
//! fixed key:
//! - `attihc:settings`: the settings object
//! - `attihc:days`: an object mapping `YYYY-MM-DD` to day entries

pub mod backend;
pub mod error;
pub mod local;

pub use backend::{FileBackend, KeyValueBackend, MemoryBackend};
pub use error::{ImportError, StorageError};
pub use local::{LocalStore, DAYS_KEY, SETTINGS_KEY};
