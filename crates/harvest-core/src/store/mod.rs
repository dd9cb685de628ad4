//! Persistence capability for conversions (SQLite via sqlx, or in memory).
//!
//! Rows live in one table per month of their own `conversion_time`; the
//! natural key is that shard plus the API's `conversion_id`.

mod db;
mod memory;

pub use db::ConversionDb;
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::conversion::{ConversionRecord, StoredConversion};

/// Persistence failure for a single record. The worker logs it and moves on.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("unreadable row in {table}: {reason}")]
    BadRow { table: String, reason: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Find/insert/update by natural key.
///
/// Implementations must tolerate two workers writing the same key: `insert`
/// returns `Ok(false)` when the row already exists and `update` only applies
/// when the stored status is still the one the caller observed.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    async fn find_by_natural_key(
        &self,
        time: NaiveDateTime,
        conversion_id: &str,
    ) -> Result<Option<StoredConversion>, StoreError>;

    /// Returns true if a new row was written.
    async fn insert(&self, record: &ConversionRecord) -> Result<bool, StoreError>;

    /// Returns true if the row was changed.
    async fn update(
        &self,
        existing: &StoredConversion,
        status: &str,
        value: f64,
    ) -> Result<bool, StoreError>;
}
