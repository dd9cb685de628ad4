//! In-memory conversion store for dry runs and tests.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::conversion::{shard_table, ConversionRecord, StoredConversion};

use super::{RecordStore, StoreError};

/// Keeps rows in a map keyed by `(shard, conversion_id)` and counts calls so
/// callers can check how many writes a run issued.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<(String, String), StoredConversion>>,
    inserts: AtomicUsize,
    updates: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total rows across all shards.
    pub fn len(&self) -> usize {
        self.rows.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `insert` calls that wrote a row.
    pub fn insert_calls(&self) -> usize {
        self.inserts.load(Ordering::Relaxed)
    }

    /// Number of `update` calls that changed a row.
    pub fn update_calls(&self) -> usize {
        self.updates.load(Ordering::Relaxed)
    }

    /// Make every insert/update fail with `StoreError::Unavailable`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Stored row for a natural key, if any.
    pub fn get(&self, time: NaiveDateTime, conversion_id: &str) -> Option<StoredConversion> {
        let key = (shard_table(time), conversion_id.to_string());
        self.rows.lock().ok()?.get(&key).cloned()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        Ok(())
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<(String, String), StoredConversion>>, StoreError>
    {
        self.rows
            .lock()
            .map_err(|_| StoreError::Unavailable("row map poisoned".into()))
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_by_natural_key(
        &self,
        time: NaiveDateTime,
        conversion_id: &str,
    ) -> Result<Option<StoredConversion>, StoreError> {
        let key = (shard_table(time), conversion_id.to_string());
        Ok(self.lock()?.get(&key).cloned())
    }

    async fn insert(&self, record: &ConversionRecord) -> Result<bool, StoreError> {
        self.check_writable()?;
        let mut rows = self.lock()?;
        let key = (record.shard(), record.conversion_id.clone());
        if rows.contains_key(&key) {
            return Ok(false);
        }
        let id = rows.len() as i64 + 1;
        rows.insert(
            key,
            StoredConversion {
                id,
                conversion_id: record.conversion_id.clone(),
                conversion_time: record.conversion_time,
                conversion_status: record.conversion_status.clone(),
                conversion_value: record.conversion_value,
            },
        );
        self.inserts.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    async fn update(
        &self,
        existing: &StoredConversion,
        status: &str,
        value: f64,
    ) -> Result<bool, StoreError> {
        self.check_writable()?;
        let mut rows = self.lock()?;
        let key = (
            shard_table(existing.conversion_time),
            existing.conversion_id.clone(),
        );
        match rows.get_mut(&key) {
            Some(row) if row.conversion_status == existing.conversion_status => {
                row.conversion_status = status.to_string();
                row.conversion_value = value;
                self.updates.fetch_add(1, Ordering::Relaxed);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
