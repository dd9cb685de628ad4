//! The fetch–parse–persist loop.

use std::sync::Arc;

use crate::api::{parse_page, Page};
use crate::fetch::{Fetch, FetchError, QueryParams};
use crate::partition::Job;
use crate::retry::{run_with_retry, RetryPolicy};

use super::{FetchWorker, WorkerContext, WorkerStatus};

/// Why `run` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The API reported no further pages.
    Exhausted,
    /// A page could not be fetched within the retry budget.
    Abandoned,
    /// The stop flag was set.
    Cancelled,
}

impl FetchWorker {
    /// Runs until the current job has no more pages, a page is abandoned, or
    /// a stop is requested. The worker must have been started first.
    ///
    /// If the scheduler replaces the job while a page is in flight, the loop
    /// picks up the new bounds at offset 0 instead of stopping or advancing.
    pub async fn run(&self, ctx: &WorkerContext) -> StopReason {
        tracing::debug!(worker = self.id, job = %self.job(), "worker started");
        loop {
            if self.stop_requested() {
                self.mark_stopped();
                tracing::info!(worker = self.id, "worker cancelled");
                return StopReason::Cancelled;
            }

            let (job, generation) = self.snapshot_job();
            let body = match fetch_page(ctx, &job).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(worker = self.id, %job, "abandoning page: {}", e);
                    ctx.failures
                        .record(job.from, format!("worker {} abandoned {}: {}", self.id, job, e));
                    if self.finish(generation, WorkerStatus::Error) {
                        return StopReason::Abandoned;
                    }
                    continue;
                }
            };

            let page = parse_page(&body).unwrap_or_else(|e| {
                tracing::error!(worker = self.id, %job, "{}", e);
                Page::default()
            });
            if page.conversions.is_empty() {
                tracing::warn!(worker = self.id, %job, "page has no conversions");
            } else {
                tracing::debug!(worker = self.id, %job, records = page.conversions.len(), "page fetched");
            }

            for data in &page.conversions {
                self.persist(ctx, data).await;
            }

            if page.has_more {
                self.advance(generation);
                continue;
            }
            if self.finish(generation, WorkerStatus::Stopped) {
                tracing::info!(
                    worker = self.id,
                    fetched = self.fetched(),
                    saved = self.saved(),
                    "worker finished"
                );
                return StopReason::Exhausted;
            }
            tracing::debug!(worker = self.id, job = %self.job(), "job narrowed, continuing");
        }
    }
}

/// Fetch one page for `job`, retrying per policy on the blocking pool.
async fn fetch_page(ctx: &WorkerContext, job: &Job) -> Result<Vec<u8>, FetchError> {
    let fetcher: Arc<dyn Fetch> = Arc::clone(&ctx.fetcher);
    let url = ctx.api.endpoint().to_string();
    let params: QueryParams = ctx.api.page_params(job);
    let timeout = ctx.fetch_timeout;
    let policy: RetryPolicy = ctx.retry;

    tokio::task::spawn_blocking(move || {
        run_with_retry(&policy, |_attempt| fetcher.fetch(&url, &params, timeout))
    })
    .await
    .map_err(|e| FetchError::Other(format!("fetch task: {}", e)))?
}
