//! One page of the conversion report.

use serde::{Deserialize, Serialize};

/// The page body is not the JSON the reporting API is documented to return.
#[derive(Debug, thiserror::Error)]
#[error("malformed conversion page: {0}")]
pub struct PageError(#[from] serde_json::Error);

/// Parsed page: the records in API order and whether another page follows.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub conversions: Vec<ConversionData>,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionEnvelope {
    pub conversion_data: ConversionData,
}

/// Raw record as sent by the API, before transformation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionData {
    #[serde(rename = "conversion_id")]
    pub id: String,
    pub conversion_time: String,
    #[serde(default, rename = "publisher_reference")]
    pub publisher_ref: String,
    #[serde(default, rename = "advertiser_reference")]
    pub advertiser_ref: String,
    #[serde(default, rename = "customer_reference")]
    pub customer_ref: String,
    #[serde(rename = "conversion_value")]
    pub value: ConversionValue,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionValue {
    #[serde(rename = "conversion_status")]
    pub status: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub publisher_commission: f64,
}

#[derive(Debug, Default, Deserialize)]
struct ConversionList {
    #[serde(default)]
    conversions: Vec<ConversionEnvelope>,
    #[serde(default)]
    hypermedia: Hypermedia,
}

#[derive(Debug, Default, Deserialize)]
struct Hypermedia {
    #[serde(default)]
    pagination: Pagination,
}

#[derive(Debug, Default, Deserialize)]
struct Pagination {
    #[serde(default)]
    next_page: Option<String>,
}

/// Decode a page body. A missing or empty `next_page` marks the last page.
pub fn parse_page(body: &[u8]) -> Result<Page, PageError> {
    let list: ConversionList = serde_json::from_slice(body)?;
    let has_more = list
        .hypermedia
        .pagination
        .next_page
        .as_deref()
        .is_some_and(|s| !s.is_empty());
    Ok(Page {
        conversions: list
            .conversions
            .into_iter()
            .map(|e| e.conversion_data)
            .collect(),
        has_more,
    })
}
