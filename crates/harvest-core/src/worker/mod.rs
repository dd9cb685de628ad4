//! Fetch worker: owns one job and pages through it until the API runs dry.
//!
//! The loop itself lives in `run`; `persist` holds the per-record upsert.
//! Status, job and the last observed record time sit behind one mutex so the
//! scheduler can swap the job atomically with the worker's decision to stop.
//! Counters are single-writer atomics read relaxed by the reporting surface.

mod context;
mod persist;
mod run;
mod status;

pub use context::WorkerContext;
pub use persist::{upsert, UpsertOutcome};
pub use run::StopReason;
pub use status::{WorkerRow, WorkerStatus};

use chrono::NaiveDateTime;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::partition::Job;

/// Worker identifier, assigned by the scheduler and never reused.
pub type WorkerId = u32;

#[derive(Debug)]
struct WorkerState {
    status: WorkerStatus,
    job: Job,
    /// Bumped every time the job is assigned or replaced.
    generation: u64,
    /// Latest record time processed in the current job.
    last_observed: NaiveDateTime,
}

#[derive(Debug)]
pub struct FetchWorker {
    id: WorkerId,
    state: Mutex<WorkerState>,
    fetched: AtomicU64,
    saved: AtomicU64,
    stop: AtomicBool,
}

impl FetchWorker {
    /// New idle worker holding `job`.
    pub fn new(id: WorkerId, job: Job) -> Self {
        Self {
            id,
            state: Mutex::new(WorkerState {
                status: WorkerStatus::Stopped,
                job,
                generation: 0,
                last_observed: job.from,
            }),
            fetched: AtomicU64::new(0),
            saved: AtomicU64::new(0),
            stop: AtomicBool::new(false),
        }
    }

    fn state(&self) -> MutexGuard<'_, WorkerState> {
        // Critical sections never panic; recover the data if one somehow did.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn status(&self) -> WorkerStatus {
        self.state().status
    }

    pub fn job(&self) -> Job {
        self.state().job
    }

    pub fn last_observed(&self) -> NaiveDateTime {
        self.state().last_observed
    }

    pub fn fetched(&self) -> u64 {
        self.fetched.load(Ordering::Relaxed)
    }

    pub fn saved(&self) -> u64 {
        self.saved.load(Ordering::Relaxed)
    }

    /// Ask the loop to exit before its next fetch. An in-flight fetch is not interrupted.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Assign `job` and mark the worker running. The caller spawns the loop.
    pub(crate) fn start(&self, job: Job) {
        let mut st = self.state();
        st.job = job;
        st.generation += 1;
        st.last_observed = job.from;
        st.status = WorkerStatus::Running;
    }

    /// Remaining range `[last_observed, job.to)` if the worker is running and
    /// trails its job end by more than `threshold`, plus the job generation it
    /// was read from.
    pub(crate) fn lagging_range(
        &self,
        threshold: chrono::Duration,
    ) -> Option<(NaiveDateTime, NaiveDateTime, u64)> {
        let st = self.state();
        if st.status != WorkerStatus::Running {
            return None;
        }
        if st.job.to - st.last_observed > threshold {
            Some((st.last_observed, st.job.to, st.generation))
        } else {
            None
        }
    }

    /// Replace the job of a running worker in place, unless it stopped or its
    /// job changed since `generation` was read. Returns whether the swap happened.
    pub(crate) fn replace_job(&self, generation: u64, job: Job) -> bool {
        let mut st = self.state();
        if st.status != WorkerStatus::Running || st.generation != generation {
            return false;
        }
        st.job = job;
        st.generation += 1;
        st.last_observed = job.from;
        true
    }

    /// Current job and its generation, read together.
    fn snapshot_job(&self) -> (Job, u64) {
        let st = self.state();
        (st.job, st.generation)
    }

    /// Move to the next page unless the job was replaced while the page was in flight.
    fn advance(&self, generation: u64) {
        let mut st = self.state();
        if st.generation == generation {
            st.job.advance();
        }
    }

    /// Enter a terminal status unless the job was replaced meanwhile.
    fn finish(&self, generation: u64, status: WorkerStatus) -> bool {
        let mut st = self.state();
        if st.generation != generation {
            return false;
        }
        st.status = status;
        true
    }

    fn mark_stopped(&self) {
        self.state().status = WorkerStatus::Stopped;
    }

    /// Raise the high-water mark to `t`.
    fn observe(&self, t: NaiveDateTime) {
        let mut st = self.state();
        if t > st.last_observed {
            st.last_observed = t;
        }
    }

    /// One line of the status table.
    pub fn row(&self) -> WorkerRow {
        let (status, job) = {
            let st = self.state();
            (st.status, st.job)
        };
        WorkerRow {
            id: self.id,
            status,
            offset: job.offset,
            fetched: self.fetched(),
            saved: self.saved(),
            job: job.to_string(),
        }
    }
}

#[cfg(test)]
mod tests;
