//! Worker status and the per-worker status line.

use serde::Serialize;

use super::WorkerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Running,
    /// Ran out of pages (or was cancelled).
    #[serde(rename = "stop")]
    Stopped,
    /// Stopped after a page could not be fetched within the retry budget.
    Error,
}

impl WorkerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkerStatus::Running => "running",
            WorkerStatus::Stopped => "stop",
            WorkerStatus::Error => "error",
        }
    }

    /// Stopped or Error: the worker's loop has exited and it can take a new job.
    pub fn is_stopped(self) -> bool {
        !matches!(self, WorkerStatus::Running)
    }
}

/// Snapshot of one worker for the status table.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerRow {
    pub id: WorkerId,
    pub status: WorkerStatus,
    pub offset: u32,
    pub fetched: u64,
    pub saved: u64,
    /// Job description, `-from=.. -to=.. -offset=..`.
    pub job: String,
}
