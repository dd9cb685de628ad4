//! Job type: a half-open time range plus its pagination cursor.

use chrono::NaiveDateTime;
use std::fmt;

use super::time::format_job_time;

/// Page size requested from the reporting API unless configured otherwise.
pub const PAGE_LIMIT: u32 = 100;

/// A single job: time range [from, to) (half-open) and the page cursor within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Job {
    /// Start of the window (inclusive).
    pub from: NaiveDateTime,
    /// End of the window (exclusive).
    pub to: NaiveDateTime,
    /// Records already paged through, in units of `limit`.
    pub offset: u32,
    /// Page size.
    pub limit: u32,
}

impl Job {
    /// New job at offset 0.
    pub fn new(from: NaiveDateTime, to: NaiveDateTime, limit: u32) -> Self {
        Self {
            from,
            to,
            offset: 0,
            limit,
        }
    }

    /// Width of the window in whole seconds (0 if inverted).
    pub fn span_secs(&self) -> i64 {
        (self.to - self.from).num_seconds().max(0)
    }

    /// Move the cursor to the next page.
    pub fn advance(&mut self) {
        self.offset = self.offset.saturating_add(self.limit);
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "-from={} -to={} -offset={}",
            format_job_time(self.from),
            format_job_time(self.to),
            self.offset
        )
    }
}
