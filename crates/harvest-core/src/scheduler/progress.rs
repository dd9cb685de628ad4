//! Aggregate progress across all workers of a harvest.
//!
//! Built by summing worker counters at call time; counters are read relaxed so
//! a snapshot may be slightly stale, which is fine for display.

use serde::{Deserialize, Serialize};

/// Pull-based snapshot for status displays. JSON field names match the
/// status push consumers already understand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestSnapshot {
    #[serde(rename = "worker_num")]
    pub worker_count: usize,
    #[serde(rename = "offset")]
    pub total_offset: u64,
    #[serde(rename = "fetched_num")]
    pub total_fetched: u64,
    #[serde(rename = "saved_num")]
    pub total_saved: u64,
    #[serde(rename = "stop_num")]
    pub stopped_count: usize,
}

impl HarvestSnapshot {
    /// True while at least one worker is still running.
    pub fn is_working(&self) -> bool {
        self.worker_count != 0 && self.worker_count != self.stopped_count
    }
}
