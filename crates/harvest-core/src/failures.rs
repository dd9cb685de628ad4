//! Keyed sink for failures worth inspecting after a run.
//!
//! Abandoned pages and records that could not be written end up here. Entries
//! are never retried.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct FailureRegistry {
    entries: Mutex<BTreeMap<NaiveDateTime, Vec<String>>>,
}

impl FailureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `what` under `at` (the job start or the record time).
    pub fn record(&self, at: NaiveDateTime, what: impl Into<String>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.entry(at).or_default().push(what.into());
        }
    }

    /// All entries in time order.
    pub fn entries(&self) -> Vec<(NaiveDateTime, String)> {
        let Ok(entries) = self.entries.lock() else {
            return Vec::new();
        };
        entries
            .iter()
            .flat_map(|(t, list)| list.iter().map(move |s| (*t, s.clone())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .map(|e| e.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
