//! Test doubles shared by unit tests.

use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::ReportApi;
use crate::failures::FailureRegistry;
use crate::fetch::{Fetch, FetchError, QueryParams};
use crate::retry::RetryPolicy;
use crate::store::{MemoryStore, RecordStore};
use crate::worker::WorkerContext;

/// Page body with one record per `(id, time, status, value)` tuple.
pub(crate) fn page_json(records: &[(&str, &str, &str, f64)], has_more: bool) -> Vec<u8> {
    let conversions: Vec<_> = records
        .iter()
        .map(|(id, time, status, value)| {
            json!({"conversion_data": {
                "conversion_id": id,
                "conversion_time": time,
                "publisher_reference": "u42:app",
                "advertiser_reference": "In-App",
                "customer_reference": "c",
                "conversion_value": {
                    "conversion_status": status,
                    "value": value,
                    "publisher_commission": 1.0
                }
            }})
        })
        .collect();
    let next = if has_more { "/next" } else { "" };
    serde_json::to_vec(&json!({
        "conversions": conversions,
        "hypermedia": {"pagination": {"next_page": next}}
    }))
    .unwrap()
}

/// Replays a fixed list of responses; an empty last page once exhausted.
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    responses: Mutex<VecDeque<Result<Vec<u8>, FetchError>>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<QueryParams>>,
}

impl ScriptedFetcher {
    pub(crate) fn new(responses: Vec<Result<Vec<u8>, FetchError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn seen(&self) -> Vec<QueryParams> {
        self.seen.lock().unwrap().clone()
    }
}

impl Fetch for ScriptedFetcher {
    fn fetch(
        &self,
        _url: &str,
        params: &QueryParams,
        _timeout: Duration,
    ) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(params.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(page_json(&[], false)))
    }
}

pub(crate) fn context(fetcher: Arc<dyn Fetch>, store: Arc<dyn RecordStore>) -> WorkerContext {
    WorkerContext {
        fetcher,
        store,
        api: ReportApi::with_endpoint("http://127.0.0.1/conversion", "USD"),
        retry: RetryPolicy::default(),
        fetch_timeout: Duration::from_secs(5),
        atoken: "tok".into(),
        failures: Arc::new(FailureRegistry::new()),
    }
}

pub(crate) fn memory_context(fetcher: Arc<ScriptedFetcher>) -> (WorkerContext, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (context(fetcher, store.clone()), store)
}
