//! Everything a worker loop needs besides its own job.

use std::sync::Arc;
use std::time::Duration;

use crate::api::ReportApi;
use crate::config::HarvestConfig;
use crate::failures::FailureRegistry;
use crate::fetch::Fetch;
use crate::retry::RetryPolicy;
use crate::store::RecordStore;

/// Shared by all workers of a scheduler.
pub struct WorkerContext {
    pub fetcher: Arc<dyn Fetch>,
    pub store: Arc<dyn RecordStore>,
    pub api: ReportApi,
    pub retry: RetryPolicy,
    /// Upper bound for one fetch call.
    pub fetch_timeout: Duration,
    /// Account token stamped on stored rows.
    pub atoken: String,
    pub failures: Arc<FailureRegistry>,
}

impl WorkerContext {
    pub fn from_config(
        cfg: &HarvestConfig,
        fetcher: Arc<dyn Fetch>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            fetcher,
            store,
            api: ReportApi::from_config(&cfg.api),
            retry: RetryPolicy::from(&cfg.retry_or_default()),
            fetch_timeout: cfg.fetch_timeout(),
            atoken: cfg.api.atoken.clone(),
            failures: Arc::new(FailureRegistry::new()),
        }
    }
}
