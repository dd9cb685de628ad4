use std::sync::Arc;

use super::*;
use crate::fetch::FetchError;
use crate::partition::{parse_cli_time, PAGE_LIMIT};
use crate::store::{MemoryStore, RecordStore};
use crate::testing::{memory_context, page_json, ScriptedFetcher};

fn job() -> Job {
    Job::new(
        parse_cli_time("2017-02-13T00:00:00").unwrap(),
        parse_cli_time("2017-02-13T06:00:00").unwrap(),
        PAGE_LIMIT,
    )
}

fn started(id: WorkerId) -> FetchWorker {
    let w = FetchWorker::new(id, job());
    w.start(job());
    w
}

fn err() -> Result<Vec<u8>, FetchError> {
    Err(FetchError::Http(502))
}

#[tokio::test]
async fn pages_until_no_next_page() {
    let fetcher = Arc::new(ScriptedFetcher::new(vec![
        Ok(page_json(&[("a", "2017-02-13 01:00:00", "pending", 1.0)], true)),
        Ok(page_json(&[("b", "2017-02-13 02:00:00", "pending", 2.0)], false)),
    ]));
    let (ctx, store) = memory_context(fetcher.clone());
    let w = started(1);

    assert_eq!(w.run(&ctx).await, StopReason::Exhausted);
    assert_eq!(w.status(), WorkerStatus::Stopped);
    assert_eq!(w.fetched(), 2);
    assert_eq!(w.saved(), 2);
    assert_eq!(store.len(), 2);
    assert_eq!(w.job().offset, 100);
    assert_eq!(w.last_observed(), parse_cli_time("2017-02-13T02:00:00").unwrap());

    let seen = fetcher.seen();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0]["offset"], "0");
    assert_eq!(seen[1]["offset"], "100");
    assert_eq!(seen[1]["start_date"], "2017-02-13 00:00:00");
}

#[tokio::test]
async fn two_failures_then_success_processes_the_page() {
    let fetcher = Arc::new(ScriptedFetcher::new(vec![
        err(),
        err(),
        Ok(page_json(&[("a", "2017-02-13 01:00:00", "pending", 1.0)], false)),
    ]));
    let (ctx, store) = memory_context(fetcher.clone());
    let w = started(1);

    assert_eq!(w.run(&ctx).await, StopReason::Exhausted);
    assert_eq!(fetcher.calls(), 3);
    assert_eq!(store.len(), 1);
    assert!(ctx.failures.is_empty());
    assert_eq!(w.status(), WorkerStatus::Stopped);
}

#[tokio::test]
async fn three_failures_abandon_the_job() {
    let fetcher = Arc::new(ScriptedFetcher::new(vec![
        err(),
        err(),
        err(),
        Ok(page_json(&[("a", "2017-02-13 01:00:00", "pending", 1.0)], false)),
    ]));
    let (ctx, store) = memory_context(fetcher.clone());
    let w = started(1);

    assert_eq!(w.run(&ctx).await, StopReason::Abandoned);
    assert_eq!(fetcher.calls(), 3);
    assert!(store.is_empty());
    assert_eq!(w.fetched(), 0);
    assert_eq!(w.status(), WorkerStatus::Error);
    assert!(w.status().is_stopped());
    assert_eq!(w.job().offset, 0, "abandoned page must not advance the cursor");
    assert_eq!(ctx.failures.len(), 1);
}

#[tokio::test]
async fn bad_records_are_skipped_not_saved() {
    let mut body: serde_json::Value = serde_json::from_slice(&page_json(
        &[
            ("a", "2017-02-13 01:00:00", "pending", 1.0),
            ("bad-time", "yesterday", "pending", 1.0),
            ("c", "2017-02-13 03:00:00", "pending", 1.0),
        ],
        false,
    ))
    .unwrap();
    body["conversions"][2]["conversion_data"]["publisher_reference"] = "nouid".into();
    let fetcher = Arc::new(ScriptedFetcher::new(vec![Ok(serde_json::to_vec(&body).unwrap())]));
    let (ctx, store) = memory_context(fetcher);
    let w = started(1);

    w.run(&ctx).await;
    assert_eq!(w.fetched(), 3);
    assert_eq!(w.saved(), 1);
    assert_eq!(store.len(), 1);
    assert_eq!(w.last_observed(), parse_cli_time("2017-02-13T01:00:00").unwrap());
}

#[tokio::test]
async fn zero_value_is_saved_without_a_write() {
    let fetcher = Arc::new(ScriptedFetcher::new(vec![Ok(page_json(
        &[("a", "2017-02-13 01:00:00", "pending", 0.0)],
        false,
    ))]));
    let (ctx, store) = memory_context(fetcher);
    let w = started(1);

    w.run(&ctx).await;
    assert_eq!(w.saved(), 1);
    assert!(store.is_empty());
}

#[tokio::test]
async fn store_failure_counts_fetched_not_saved() {
    let fetcher = Arc::new(ScriptedFetcher::new(vec![Ok(page_json(
        &[
            ("a", "2017-02-13 01:00:00", "pending", 1.0),
            ("b", "2017-02-13 02:00:00", "pending", 1.0),
        ],
        false,
    ))]));
    let (ctx, store) = memory_context(fetcher);
    store.set_fail_writes(true);
    let w = started(1);

    assert_eq!(w.run(&ctx).await, StopReason::Exhausted);
    assert_eq!(w.fetched(), 2);
    assert_eq!(w.saved(), 0);
    assert_eq!(ctx.failures.len(), 2);
}

#[tokio::test]
async fn malformed_body_ends_the_job() {
    let fetcher = Arc::new(ScriptedFetcher::new(vec![Ok(b"<html>".to_vec())]));
    let (ctx, _store) = memory_context(fetcher.clone());
    let w = started(1);

    assert_eq!(w.run(&ctx).await, StopReason::Exhausted);
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(w.status(), WorkerStatus::Stopped);
}

#[tokio::test]
async fn stop_request_exits_before_fetching() {
    let fetcher = Arc::new(ScriptedFetcher::new(vec![]));
    let (ctx, _store) = memory_context(fetcher.clone());
    let w = started(1);
    w.request_stop();

    assert_eq!(w.run(&ctx).await, StopReason::Cancelled);
    assert_eq!(fetcher.calls(), 0);
    assert_eq!(w.status(), WorkerStatus::Stopped);
}

#[test]
fn replaced_job_restarts_cursor_and_is_not_advanced() {
    let w = started(1);
    let (_, generation) = w.snapshot_job();
    w.advance(generation);
    assert_eq!(w.job().offset, 100);

    let narrowed = Job::new(
        parse_cli_time("2017-02-13T03:00:00").unwrap(),
        parse_cli_time("2017-02-13T06:00:00").unwrap(),
        PAGE_LIMIT,
    );
    assert!(w.replace_job(generation, narrowed));
    assert_eq!(w.last_observed(), narrowed.from);

    // A page fetched under the old job neither advances nor stops the new one.
    w.advance(generation);
    assert_eq!(w.job().offset, 0);
    assert!(!w.finish(generation, WorkerStatus::Stopped));
    assert_eq!(w.status(), WorkerStatus::Running);

    // A stale generation cannot replace again.
    assert!(!w.replace_job(generation, job()));
}

#[test]
fn lagging_range_only_for_running_workers_past_threshold() {
    let hour = chrono::Duration::hours(1);
    let w = FetchWorker::new(1, job());
    assert!(w.lagging_range(hour).is_none(), "stopped worker never lags");

    w.start(job());
    let (from, to, _) = w.lagging_range(hour).expect("6h behind");
    assert_eq!(from, job().from);
    assert_eq!(to, job().to);

    w.observe(parse_cli_time("2017-02-13T05:00:00").unwrap());
    assert!(w.lagging_range(hour).is_none(), "exactly 1h is not more than 1h");
    // The high-water mark never moves backwards.
    w.observe(parse_cli_time("2017-02-13T01:00:00").unwrap());
    assert_eq!(w.last_observed(), parse_cli_time("2017-02-13T05:00:00").unwrap());
}

#[test]
fn row_reflects_counters_and_job() {
    let w = started(7);
    let row = w.row();
    assert_eq!(row.id, 7);
    assert_eq!(row.status.as_str(), "running");
    assert_eq!(row.job, "-from=2017-02-13T00:00:00 -to=2017-02-13T06:00:00 -offset=0");
}

mod upsert_semantics {
    use super::*;
    use crate::api::{ConversionData, ConversionValue};
    use crate::conversion::to_record;

    fn record(status: &str, value: f64) -> crate::conversion::ConversionRecord {
        let data = ConversionData {
            id: "c-1".into(),
            conversion_time: "2017-02-13 01:00:00".into(),
            publisher_ref: "u1:app".into(),
            value: ConversionValue {
                status: status.into(),
                value,
                publisher_commission: 0.0,
            },
            ..ConversionData::default()
        };
        to_record(&data, "tok", parse_cli_time("2017-03-01T00:00:00").unwrap()).unwrap()
    }

    #[tokio::test]
    async fn same_record_twice_is_one_row_and_no_update() {
        let store = MemoryStore::new();
        let rec = record("pending", 5.0);
        assert_eq!(upsert(&store, &rec).await.unwrap(), UpsertOutcome::Inserted);
        assert_eq!(upsert(&store, &rec).await.unwrap(), UpsertOutcome::Unchanged);
        assert_eq!(store.len(), 1);
        assert_eq!(store.insert_calls(), 1);
        assert_eq!(store.update_calls(), 0);
    }

    #[tokio::test]
    async fn status_change_issues_exactly_one_update() {
        let store = MemoryStore::new();
        upsert(&store, &record("pending", 5.0)).await.unwrap();
        let changed = record("approved", 6.0);
        assert_eq!(upsert(&store, &changed).await.unwrap(), UpsertOutcome::Updated);
        assert_eq!(store.len(), 1);
        assert_eq!(store.update_calls(), 1);

        let row = store
            .find_by_natural_key(changed.conversion_time, "c-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.conversion_status, "approved");
        assert!((row.conversion_value - 6.0).abs() < 1e-9);
    }
}
