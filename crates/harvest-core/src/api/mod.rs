//! Reporting API: endpoint, page query parameters and the page JSON shape.

mod page;

pub use page::{parse_page, ConversionData, ConversionEnvelope, ConversionValue, Page, PageError};

use crate::config::ApiConfig;
use crate::fetch::QueryParams;
use crate::partition::{format_api_time, Job};

/// Resolved endpoint plus the fixed query parameters shared by every page request.
#[derive(Debug, Clone)]
pub struct ReportApi {
    endpoint: String,
    convert_currency: String,
}

impl ReportApi {
    pub fn from_config(cfg: &ApiConfig) -> Self {
        let auth = if cfg.app_key.is_empty() && cfg.api_key.is_empty() {
            String::new()
        } else {
            format!("{}:{}@", cfg.app_key, cfg.api_key)
        };
        let endpoint = format!(
            "https://{}{}/reporting/report_publisher/publisher/{}/conversion",
            auth, cfg.host, cfg.publisher_id
        );
        Self {
            endpoint,
            convert_currency: cfg.convert_currency.clone(),
        }
    }

    /// Endpoint pointing somewhere else (mock servers, staging).
    pub fn with_endpoint(endpoint: impl Into<String>, convert_currency: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            convert_currency: convert_currency.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Query parameters for the page `job` currently points at.
    pub fn page_params(&self, job: &Job) -> QueryParams {
        let mut params = QueryParams::new();
        params.insert("convert_currency".into(), self.convert_currency.clone());
        params.insert("offset".into(), job.offset.to_string());
        params.insert("limit".into(), job.limit.to_string());
        params.insert("start_date".into(), format_api_time(job.from));
        params.insert("end_date".into(), format_api_time(job.to));
        params
    }
}
