//! Row types for the month-sharded conversion tables.

use chrono::NaiveDateTime;

/// Table a conversion lives in: one table per month of its own `conversion_time`.
pub fn shard_table(t: NaiveDateTime) -> String {
    format!("conversion_{}", t.format("%Y%m"))
}

/// A conversion ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRecord {
    pub conversion_id: String,
    pub conversion_time: NaiveDateTime,
    pub uid: i64,
    pub app_id: String,
    pub customer_reference: String,
    pub conversion_status: String,
    pub conversion_value: f64,
    pub publisher_commission: f64,
    pub payed_user: u8,
    pub pay_user_amount: f64,
    /// Unix seconds of `conversion_time`.
    pub pay_time: i64,
    /// Day of month of `conversion_time`.
    pub pay_time_day: u32,
    pub atoken: String,
    /// 0 for `u`-prefixed user ids, 1 otherwise.
    pub kind: u8,
    pub in_app: u8,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ConversionRecord {
    pub fn shard(&self) -> String {
        shard_table(self.conversion_time)
    }
}

/// The part of a stored row the upsert decision needs.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredConversion {
    pub id: i64,
    pub conversion_id: String,
    pub conversion_time: NaiveDateTime,
    pub conversion_status: String,
    pub conversion_value: f64,
}
