//! Window partitioning into per-worker jobs.

use chrono::{Duration, NaiveDateTime};

use super::job::Job;

/// Partitioning is infeasible for the requested window and job count.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PartitionError {
    #[error("cannot split {from}..{to} into {n} jobs: job count is zero or window is too small")]
    InvalidRange {
        from: NaiveDateTime,
        to: NaiveDateTime,
        n: usize,
    },
}

/// Splits `[from, to)` into `n` contiguous jobs of `floor((to - from) / n)` seconds.
///
/// The last job's `to` is set to the requested `to` so the remainder is absorbed
/// and the union of jobs covers the window exactly. Fails when `n` is 0 or
/// the per-job interval would be zero or negative.
pub fn partition(
    from: NaiveDateTime,
    to: NaiveDateTime,
    n: usize,
    limit: u32,
) -> Result<Vec<Job>, PartitionError> {
    let invalid = || PartitionError::InvalidRange { from, to, n };
    if n == 0 {
        return Err(invalid());
    }

    let diff = to.signed_duration_since(from).num_seconds();
    let interval = diff / n as i64;
    if interval <= 0 {
        return Err(invalid());
    }

    let mut out = Vec::with_capacity(n);
    for i in 0..n as i64 {
        let start = from + Duration::seconds(i * interval);
        let end = from + Duration::seconds((i + 1) * interval);
        out.push(Job::new(start, end, limit));
    }
    if let Some(last) = out.last_mut() {
        last.to = to;
    }

    Ok(out)
}
