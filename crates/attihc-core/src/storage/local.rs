use std::sync::Arc;

use tracing::{debug, warn};

use super::{ImportError, KeyValueBackend, StorageError};
use crate::models::{decode_days, Days, Settings};

/// Storage key for the settings record.
pub const SETTINGS_KEY: &str = "attihc:settings";

/// Storage key for the days record.
pub const DAYS_KEY: &str = "attihc:days";

/// Reads and writes the two persisted records as JSON text.
///
/// Loads never fail: missing or corrupt records come back as defaults.
/// Writes report their outcome and leave the retry/ignore decision to
/// the caller.
#[derive(Clone)]
pub struct LocalStore {
    backend: Arc<dyn KeyValueBackend>,
}

impl LocalStore {
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.backend.get(key) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "Failed to read storage key, using defaults");
                None
            }
        }
    }

    // ===== Settings =====

    pub fn load_settings(&self) -> Settings {
        match self.read(SETTINGS_KEY) {
            Some(raw) => Settings::from_json(&raw),
            None => Settings::default(),
        }
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<(), StorageError> {
        let contents = serde_json::to_string(settings)?;
        self.backend.set(SETTINGS_KEY, &contents)
    }

    // ===== Days =====

    /// Load the days record. `now_ms` stands in for entries whose
    /// `createdAt` is unreadable.
    pub fn load_days(&self, now_ms: i64) -> Days {
        let Some(raw) = self.read(DAYS_KEY) else {
            return Days::new();
        };
        match decode_days(&raw, now_ms) {
            Ok(days) => days,
            Err(e) => {
                warn!(error = %e, "Stored days record is unreadable, starting empty");
                Days::new()
            }
        }
    }

    pub fn save_days(&self, days: &Days) -> Result<(), StorageError> {
        let contents = serde_json::to_string(days)?;
        self.backend.set(DAYS_KEY, &contents)?;
        debug!(entries = days.len(), "Days saved");
        Ok(())
    }

    pub fn clear_days(&self) -> Result<(), StorageError> {
        self.backend.remove(DAYS_KEY)
    }

    /// The persisted days record, verbatim, or `{}` when none exists.
    pub fn export_days(&self) -> Result<String, StorageError> {
        Ok(self
            .backend
            .get(DAYS_KEY)?
            .unwrap_or_else(|| "{}".to_string()))
    }

    // ===== Import =====

    /// Validate and sanitize an import without writing anything.
    pub fn parse_import(&self, raw: &str, now_ms: i64) -> Result<Days, ImportError> {
        decode_days(raw, now_ms)
    }

    /// Validate, sanitize and persist an import, replacing the stored days.
    ///
    /// On any error the stored record is left as it was.
    pub fn import_days(&self, raw: &str, now_ms: i64) -> Result<Days, ImportError> {
        let days = self.parse_import(raw, now_ms)?;
        self.save_days(&days)?;
        debug!(entries = days.len(), "Imported days saved");
        Ok(days)
    }
}
