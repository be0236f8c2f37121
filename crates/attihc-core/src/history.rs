//! Browsing past entries: newest-first listing and filtering.

use crate::models::{DayEntry, Days};

/// All entries, newest first.
pub fn history(days: &Days) -> Vec<DayEntry> {
    days.values().rev().cloned().collect()
}

/// Narrows a history listing. An empty filter keeps everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    /// Case-insensitive text matched against the date and every text field.
    pub query: String,
    pub has_focus: bool,
    pub has_scratch: bool,
    pub favorites_only: bool,
}

impl HistoryFilter {
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn matches(&self, entry: &DayEntry) -> bool {
        let query = self.query.trim().to_lowercase();
        if !query.is_empty() {
            let haystack = std::iter::once(entry.date())
                .chain(entry.text_fields())
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase();
            if !haystack.contains(&query) {
                return false;
            }
        }
        if self.has_focus && entry.focus.trim().is_empty() {
            return false;
        }
        if self.has_scratch && entry.scratch.trim().is_empty() {
            return false;
        }
        if self.favorites_only && !entry.favorite {
            return false;
        }
        true
    }

    pub fn apply(&self, entries: &[DayEntry]) -> Vec<DayEntry> {
        entries.iter().filter(|e| self.matches(e)).cloned().collect()
    }
}
