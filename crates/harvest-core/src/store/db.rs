//! SQLite-backed conversion store.
//!
//! Handles connection and lazy creation of the monthly shard tables.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use crate::conversion::{shard_table, ConversionRecord, StoredConversion};
use crate::partition::format_job_time;

use super::{RecordStore, StoreError};

const ROW_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Percent-encode a path for use in a sqlite:// URI so spaces and special chars don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

/// Handle to the SQLite conversion database.
///
/// The default file is `~/.local/state/harvest/conversions.db`.
pub struct ConversionDb {
    pool: Pool<Sqlite>,
    /// Shard tables known to exist in this database.
    shards: Mutex<HashSet<String>>,
}

impl ConversionDb {
    fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self {
            pool,
            shards: Mutex::new(HashSet::new()),
        }
    }

    /// Open (or create) the default database.
    pub async fn open_default() -> Result<Self> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("harvest")?;
        let db_path = xdg_dirs.get_state_home().join("conversions.db");
        Self::open_at(db_path).await
    }

    /// Open (or create) the database at a specific path. Creates parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let uri = path_to_sqlite_uri(path) + "?mode=rwc";
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect(&uri)
            .await?;
        Ok(Self::from_pool(pool))
    }

    /// Number of rows in the shard that holds `time`.
    pub async fn count_in_shard(&self, time: NaiveDateTime) -> Result<i64, StoreError> {
        let table = self.ensure_shard(time).await?;
        let row = sqlx::query(&format!("SELECT COUNT(*) AS n FROM {table}"))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// Creates the shard table for `time` on first use and returns its name.
    async fn ensure_shard(&self, time: NaiveDateTime) -> Result<String, StoreError> {
        let table = shard_table(time);
        if self.shards.lock().map(|s| s.contains(&table)).unwrap_or(false) {
            return Ok(table);
        }

        // `conversion_id` is unique per shard so concurrent inserts of the same
        // record from two workers collapse to one row.
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                conversion_id TEXT NOT NULL UNIQUE,
                conversion_time TEXT NOT NULL,
                uid INTEGER NOT NULL,
                app_id TEXT NOT NULL,
                customer_reference TEXT NOT NULL,
                conversion_status TEXT NOT NULL,
                conversion_value REAL NOT NULL,
                publisher_commission REAL NOT NULL,
                payed_user INTEGER NOT NULL DEFAULT 0,
                pay_user_amount REAL NOT NULL,
                pay_time INTEGER NOT NULL,
                pay_time_day INTEGER NOT NULL,
                type INTEGER NOT NULL,
                at TEXT NOT NULL,
                in_app INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#
        ))
        .execute(&self.pool)
        .await?;

        if let Ok(mut shards) = self.shards.lock() {
            shards.insert(table.clone());
        }
        Ok(table)
    }
}

#[async_trait]
impl RecordStore for ConversionDb {
    async fn find_by_natural_key(
        &self,
        time: NaiveDateTime,
        conversion_id: &str,
    ) -> Result<Option<StoredConversion>, StoreError> {
        let table = self.ensure_shard(time).await?;
        let row = sqlx::query(&format!(
            r#"
            SELECT id, conversion_id, conversion_time, conversion_status, conversion_value
            FROM {table}
            WHERE conversion_id = ?1
            "#
        ))
        .bind(conversion_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let time_str: String = row.get("conversion_time");
        let conversion_time = NaiveDateTime::parse_from_str(&time_str, ROW_TIME_FORMAT)
            .map_err(|e| StoreError::BadRow {
                table: table.clone(),
                reason: format!("conversion_time {time_str:?}: {e}"),
            })?;

        Ok(Some(StoredConversion {
            id: row.get("id"),
            conversion_id: row.get("conversion_id"),
            conversion_time,
            conversion_status: row.get("conversion_status"),
            conversion_value: row.get("conversion_value"),
        }))
    }

    async fn insert(&self, record: &ConversionRecord) -> Result<bool, StoreError> {
        let table = self.ensure_shard(record.conversion_time).await?;
        let r = sqlx::query(&format!(
            r#"
            INSERT INTO {table} (
                conversion_id, conversion_time, uid, app_id, customer_reference,
                conversion_status, conversion_value, publisher_commission,
                payed_user, pay_user_amount, pay_time, pay_time_day, type, at, in_app,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            ON CONFLICT(conversion_id) DO NOTHING
            "#
        ))
        .bind(&record.conversion_id)
        .bind(format_job_time(record.conversion_time))
        .bind(record.uid)
        .bind(&record.app_id)
        .bind(&record.customer_reference)
        .bind(&record.conversion_status)
        .bind(record.conversion_value)
        .bind(record.publisher_commission)
        .bind(i64::from(record.payed_user))
        .bind(record.pay_user_amount)
        .bind(record.pay_time)
        .bind(i64::from(record.pay_time_day))
        .bind(i64::from(record.kind))
        .bind(&record.atoken)
        .bind(i64::from(record.in_app))
        .bind(format_job_time(record.created_at))
        .bind(format_job_time(record.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(r.rows_affected() == 1)
    }

    async fn update(
        &self,
        existing: &StoredConversion,
        status: &str,
        value: f64,
    ) -> Result<bool, StoreError> {
        let table = self.ensure_shard(existing.conversion_time).await?;
        let now = format_job_time(chrono::Utc::now().naive_utc());
        // Compare-and-swap on the status the caller saw.
        let r = sqlx::query(&format!(
            r#"
            UPDATE {table}
            SET conversion_status = ?1,
                conversion_value = ?2,
                updated_at = ?3
            WHERE id = ?4 AND conversion_status = ?5
            "#
        ))
        .bind(status)
        .bind(value)
        .bind(now)
        .bind(existing.id)
        .bind(&existing.conversion_status)
        .execute(&self.pool)
        .await?;

        Ok(r.rows_affected() == 1)
    }
}

#[cfg(test)]
/// Open an in-memory database for tests (no disk I/O).
pub(crate) async fn open_memory() -> Result<ConversionDb> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    Ok(ConversionDb::from_pool(pool))
}
