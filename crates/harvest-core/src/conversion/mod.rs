//! Persisted conversion shape and the transform from raw API records.

mod record;
mod transform;

pub use record::{shard_table, ConversionRecord, StoredConversion};
pub use transform::{to_record, TransformError};
