//! Hand a stopped worker half of a straggler's remaining range.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::partition::{partition, Job};
use crate::worker::WorkerId;

use super::Scheduler;

/// One rebalancing action: `helper` was restarted on `first`, `lagging` kept
/// running on `second`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rebalanced {
    pub helper: WorkerId,
    pub lagging: WorkerId,
    pub first: Job,
    pub second: Job,
}

impl Scheduler {
    /// Run one rebalancing pass. Picks the first stopped worker and the first
    /// running worker trailing its job end by more than the lag threshold, in
    /// creation order, and splits the straggler's remaining range in two.
    ///
    /// Does nothing while shutting down or when no such pair exists. A range
    /// too small to split is logged and skipped.
    pub(crate) fn rebalance(self: &Arc<Self>) -> Option<Rebalanced> {
        if self.shutting_down.load(Ordering::Relaxed) {
            return None;
        }

        let state = self.state();
        let helper = state.workers.iter().find(|w| w.status().is_stopped())?;
        let (lagging, (from, to, generation)) = state
            .workers
            .iter()
            .find_map(|w| w.lagging_range(self.lag_threshold).map(|r| (w, r)))?;

        let jobs = match partition(from, to, 2, self.page_limit) {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::warn!(worker = lagging.id(), "not rebalancing: {}", e);
                return None;
            }
        };
        let (first, second) = (jobs[0], jobs[1]);

        // The straggler may have finished or been narrowed since it was read.
        if !lagging.replace_job(generation, second) {
            tracing::debug!(worker = lagging.id(), "straggler moved on, skipping rebalance");
            return None;
        }
        helper.start(first);

        let done = Rebalanced {
            helper: helper.id(),
            lagging: lagging.id(),
            first,
            second,
        };
        tracing::info!(
            helper = done.helper,
            lagging = done.lagging,
            first = %first,
            second = %second,
            "rebalanced"
        );
        self.launch(Arc::clone(helper));
        Some(done)
    }
}
