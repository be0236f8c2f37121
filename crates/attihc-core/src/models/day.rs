//! Day entries: one record per logical day, keyed by `YYYY-MM-DD`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::lenient;
use crate::storage::ImportError;

/// All entries, keyed by date string. Ordered by key, which for
/// zero-padded dates is chronological.
pub type Days = BTreeMap<String, DayEntry>;

/// What the user wrote down for one logical day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct DayEntry {
    date: String,
    pub remember: String,
    pub complete: String,
    pub avoid: String,
    /// Short focus word. The UI caps it at 30 characters; the data layer
    /// does not.
    pub focus: String,
    pub scratch: String,
    created_at: i64,
    pub favorite: bool,
}

impl DayEntry {
    /// A fresh, empty entry for `date` created at `created_at` (epoch ms).
    pub fn new(date: impl Into<String>, created_at: i64) -> Self {
        Self {
            date: date.into(),
            remember: String::new(),
            complete: String::new(),
            avoid: String::new(),
            focus: String::new(),
            scratch: String::new(),
            created_at,
            favorite: false,
        }
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    /// Epoch milliseconds of first creation. Never changes.
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// The five free-text fields, in display order.
    pub fn text_fields(&self) -> [&str; 5] {
        [
            &self.remember,
            &self.complete,
            &self.avoid,
            &self.focus,
            &self.scratch,
        ]
    }

    /// True when at least one text field has non-whitespace content.
    pub fn has_content(&self) -> bool {
        self.text_fields().iter().any(|f| !f.trim().is_empty())
    }

    /// Whitespace-separated word count across all text fields.
    pub fn word_count(&self) -> usize {
        self.text_fields()
            .iter()
            .map(|f| f.split_whitespace().count())
            .sum()
    }

    pub fn field(&self, field: DayField) -> &str {
        match field {
            DayField::Remember => &self.remember,
            DayField::Complete => &self.complete,
            DayField::Avoid => &self.avoid,
            DayField::Focus => &self.focus,
            DayField::Scratch => &self.scratch,
        }
    }

    /// Merge a patch. `date` and `created_at` are not patchable.
    pub fn apply(&mut self, patch: DayPatch) {
        if let Some(v) = patch.remember {
            self.remember = v;
        }
        if let Some(v) = patch.complete {
            self.complete = v;
        }
        if let Some(v) = patch.avoid {
            self.avoid = v;
        }
        if let Some(v) = patch.focus {
            self.focus = v;
        }
        if let Some(v) = patch.scratch {
            self.scratch = v;
        }
        if let Some(v) = patch.favorite {
            self.favorite = v;
        }
    }

    /// Build an entry from an untrusted JSON value stored under `key`.
    ///
    /// Returns `None` for non-objects. Every field is coerced on its own;
    /// a missing or mistyped `createdAt` becomes `now_ms`. The date is
    /// always taken from the key.
    pub fn from_value(key: &str, value: Value, now_ms: i64) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        let stored: StoredDay = serde_json::from_value(value).ok()?;
        Some(Self {
            date: key.to_string(),
            remember: stored.remember,
            complete: stored.complete,
            avoid: stored.avoid,
            focus: stored.focus,
            scratch: stored.scratch,
            created_at: stored.created_at.unwrap_or(now_ms),
            favorite: stored.favorite,
        })
    }
}

/// Wire shape of a stored entry, decoded leniently.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StoredDay {
    #[serde(deserialize_with = "lenient::or_default")]
    remember: String,
    #[serde(deserialize_with = "lenient::or_default")]
    complete: String,
    #[serde(deserialize_with = "lenient::or_default")]
    avoid: String,
    #[serde(deserialize_with = "lenient::or_default")]
    focus: String,
    #[serde(deserialize_with = "lenient::or_default")]
    scratch: String,
    #[serde(deserialize_with = "lenient::epoch_millis")]
    created_at: Option<i64>,
    #[serde(deserialize_with = "lenient::or_default")]
    favorite: bool,
}

/// Decode a persisted or imported days record.
///
/// The text must be a JSON object; anything else is rejected. Entries
/// that are not objects are skipped.
pub fn decode_days(raw: &str, now_ms: i64) -> Result<Days, ImportError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Object(map) = value else {
        return Err(ImportError::NotAnObject);
    };

    let total = map.len();
    let days: Days = map
        .into_iter()
        .filter_map(|(key, value)| {
            DayEntry::from_value(&key, value, now_ms).map(|entry| (key, entry))
        })
        .collect();

    if days.len() < total {
        debug!(
            skipped = total - days.len(),
            kept = days.len(),
            "Skipped non-object day entries"
        );
    }
    Ok(days)
}

/// One of the five free-text fields of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayField {
    Remember,
    Complete,
    Avoid,
    Focus,
    Scratch,
}

impl DayField {
    pub const ALL: [DayField; 5] = [
        DayField::Remember,
        DayField::Complete,
        DayField::Avoid,
        DayField::Focus,
        DayField::Scratch,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DayField::Remember => "Must remember",
            DayField::Complete => "Must complete",
            DayField::Avoid => "Must avoid",
            DayField::Focus => "Focus",
            DayField::Scratch => "Scratchpad",
        }
    }
}

impl fmt::Display for DayField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DayField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "remember" => Ok(DayField::Remember),
            "complete" => Ok(DayField::Complete),
            "avoid" => Ok(DayField::Avoid),
            "focus" => Ok(DayField::Focus),
            "scratch" | "scratchpad" => Ok(DayField::Scratch),
            other => Err(format!(
                "unknown field '{}' (expected remember, complete, avoid, focus or scratch)",
                other
            )),
        }
    }
}

/// A partial update to a [`DayEntry`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayPatch {
    pub remember: Option<String>,
    pub complete: Option<String>,
    pub avoid: Option<String>,
    pub focus: Option<String>,
    pub scratch: Option<String>,
    pub favorite: Option<bool>,
}

impl DayPatch {
    /// Patch a single text field.
    pub fn text(field: DayField, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        let mut patch = Self::default();
        match field {
            DayField::Remember => patch.remember = value,
            DayField::Complete => patch.complete = value,
            DayField::Avoid => patch.avoid = value,
            DayField::Focus => patch.focus = value,
            DayField::Scratch => patch.scratch = value,
        }
        patch
    }

    pub fn favorite(on: bool) -> Self {
        Self {
            favorite: Some(on),
            ..Self::default()
        }
    }
}
