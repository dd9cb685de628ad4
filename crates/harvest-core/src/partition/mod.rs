//! Time-window math and job planning.
//!
//! Splits a harvest window `[from, to)` into N contiguous jobs, one per
//! worker, and carries the pagination cursor each worker advances.

mod job;
mod split;
mod time;

pub use job::{Job, PAGE_LIMIT};
pub use split::{partition, PartitionError};
pub use time::{format_api_time, format_job_time, parse_cli_time, parse_conversion_time};
