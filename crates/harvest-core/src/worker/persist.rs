//! Per-record transform and upsert by natural key.

use std::sync::atomic::Ordering;

use crate::api::ConversionData;
use crate::conversion::{to_record, ConversionRecord};
use crate::store::{RecordStore, StoreError};

use super::{FetchWorker, WorkerContext};

/// What `upsert` did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    /// Existing row had a different status; status and value were replaced.
    Updated,
    /// Existing row already had this status.
    Unchanged,
    /// Another writer got to the row first; its write stands.
    Raced,
}

/// Insert `record` if its natural key is absent, update status and value if the
/// stored status differs, otherwise leave the row alone.
pub async fn upsert(
    store: &dyn RecordStore,
    record: &ConversionRecord,
) -> Result<UpsertOutcome, StoreError> {
    let existing = store
        .find_by_natural_key(record.conversion_time, &record.conversion_id)
        .await?;
    match existing {
        None => Ok(if store.insert(record).await? {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Raced
        }),
        Some(row) if row.conversion_status != record.conversion_status => Ok(
            if store
                .update(&row, &record.conversion_status, record.conversion_value)
                .await?
            {
                UpsertOutcome::Updated
            } else {
                UpsertOutcome::Raced
            },
        ),
        Some(_) => Ok(UpsertOutcome::Unchanged),
    }
}

impl FetchWorker {
    /// Transform and store one record. Never fails: bad records and store
    /// errors are logged and leave the record counted as fetched but not saved.
    pub(super) async fn persist(&self, ctx: &WorkerContext, data: &ConversionData) {
        self.fetched.fetch_add(1, Ordering::Relaxed);

        let now = chrono::Utc::now().naive_utc();
        let record = match to_record(data, &ctx.atoken, now) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(worker = self.id, "skipping record: {}", e);
                return;
            }
        };
        self.observe(record.conversion_time);

        // Zero-value conversions are acknowledged without a write.
        if record.conversion_value > 0.0 {
            match upsert(ctx.store.as_ref(), &record).await {
                Ok(outcome) => {
                    tracing::trace!(worker = self.id, id = %record.conversion_id, ?outcome, "stored");
                }
                Err(e) => {
                    tracing::error!(worker = self.id, id = %record.conversion_id, "store failed: {}", e);
                    ctx.failures.record(
                        record.conversion_time,
                        format!("conversion {}: {}", record.conversion_id, e),
                    );
                    return;
                }
            }
        }
        self.saved.fetch_add(1, Ordering::Relaxed);
    }
}
