//! Job scheduler.
//!
//! Partitions a harvest window into one job per worker, launches a tokio task
//! per worker and, whenever a worker runs out of pages, hands the idle worker
//! half of a straggler's remaining range (see `rebalance`).
//!
//! The worker list and the id counter are the only state behind the scheduler
//! lock; workers own their counters and job state.

mod guard;
mod progress;
mod rebalance;

pub use progress::HarvestSnapshot;
pub use rebalance::Rebalanced;

use chrono::NaiveDateTime;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

use crate::config::HarvestConfig;
use crate::failures::FailureRegistry;
use crate::fetch::Fetch;
use crate::partition::{partition, Job, PartitionError};
use crate::store::RecordStore;
use crate::worker::{FetchWorker, StopReason, WorkerContext, WorkerId, WorkerRow};

use self::guard::ActiveGuard;

/// Why a harvest could not be launched. Nothing is spawned in either case.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Partition(#[from] PartitionError),
    #[error("a harvest is already running")]
    Busy,
}

#[derive(Default)]
struct SchedulerState {
    next_id: WorkerId,
    /// Workers of the current harvest in creation order.
    workers: Vec<Arc<FetchWorker>>,
}

pub struct Scheduler {
    state: Mutex<SchedulerState>,
    ctx: WorkerContext,
    page_limit: u32,
    lag_threshold: chrono::Duration,
    /// Live worker tasks, including relaunches.
    active: AtomicUsize,
    idle: Notify,
    shutting_down: AtomicBool,
}

impl Scheduler {
    pub fn new(ctx: WorkerContext, page_limit: u32, lag_threshold: chrono::Duration) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SchedulerState::default()),
            ctx,
            page_limit: page_limit.max(1),
            lag_threshold,
            active: AtomicUsize::new(0),
            idle: Notify::new(),
            shutting_down: AtomicBool::new(false),
        })
    }

    pub fn from_config(
        cfg: &HarvestConfig,
        fetcher: Arc<dyn Fetch>,
        store: Arc<dyn RecordStore>,
    ) -> Arc<Self> {
        Self::new(
            WorkerContext::from_config(cfg, fetcher, store),
            cfg.page_limit,
            cfg.lag_threshold(),
        )
    }

    fn state(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Split `[from, to)` into `worker_count` jobs and start one worker per job.
    ///
    /// Fails before spawning anything if the window cannot be partitioned or a
    /// previous harvest still has running workers. Workers of a finished
    /// harvest are discarded; ids keep counting up.
    pub fn partition_and_launch(
        self: &Arc<Self>,
        from: NaiveDateTime,
        to: NaiveDateTime,
        worker_count: usize,
    ) -> Result<(), SchedulerError> {
        let jobs = partition(from, to, worker_count, self.page_limit)?;

        let mut state = self.state();
        if self.active.load(Ordering::Acquire) != 0
            || state.workers.iter().any(|w| !w.status().is_stopped())
        {
            return Err(SchedulerError::Busy);
        }
        state.workers.clear();
        self.shutting_down.store(false, Ordering::Relaxed);

        for job in jobs {
            let worker = Self::register(&mut state, job);
            worker.start(job);
            self.launch(worker);
        }
        tracing::info!(workers = worker_count, %from, %to, "harvest launched");
        Ok(())
    }

    fn register(state: &mut SchedulerState, job: Job) -> Arc<FetchWorker> {
        let id = state.next_id;
        state.next_id += 1;
        let worker = Arc::new(FetchWorker::new(id, job));
        state.workers.push(Arc::clone(&worker));
        worker
    }

    /// Add an idle worker holding `job` without starting it.
    #[cfg(test)]
    pub(crate) fn add_idle_worker(&self, job: Job) -> Arc<FetchWorker> {
        Self::register(&mut self.state(), job)
    }

    /// Spawn the loop of an already started worker. When the loop ends on its
    /// own, rebalancing runs before the task exits.
    fn launch(self: &Arc<Self>, worker: Arc<FetchWorker>) {
        self.active.fetch_add(1, Ordering::AcqRel);
        let sched = Arc::clone(self);
        tokio::spawn(async move {
            let _guard = ActiveGuard {
                active: &sched.active,
                idle: &sched.idle,
            };
            let reason = worker.run(&sched.ctx).await;
            if reason != StopReason::Cancelled {
                sched.rebalance();
            }
        });
    }

    /// Resolves once no worker task is alive.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.active.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Ask every worker to stop after its current page; disables rebalancing.
    pub fn stop_all(&self) {
        self.shutting_down.store(true, Ordering::Relaxed);
        for w in self.state().workers.iter() {
            w.request_stop();
        }
        tracing::info!("stop requested for all workers");
    }

    /// Aggregate counters across all workers of the current harvest.
    pub fn snapshot(&self) -> HarvestSnapshot {
        let state = self.state();
        let mut snap = HarvestSnapshot {
            worker_count: state.workers.len(),
            ..HarvestSnapshot::default()
        };
        for w in state.workers.iter() {
            let row = w.row();
            snap.total_offset += u64::from(row.offset);
            snap.total_fetched += row.fetched;
            snap.total_saved += row.saved;
            if row.status.is_stopped() {
                snap.stopped_count += 1;
            }
        }
        snap
    }

    pub fn is_working(&self) -> bool {
        self.snapshot().is_working()
    }

    /// One row per worker, in creation order.
    pub fn worker_rows(&self) -> Vec<WorkerRow> {
        self.state().workers.iter().map(|w| w.row()).collect()
    }

    pub fn workers(&self) -> Vec<Arc<FetchWorker>> {
        self.state().workers.clone()
    }

    pub fn failures(&self) -> &FailureRegistry {
        &self.ctx.failures
    }
}
