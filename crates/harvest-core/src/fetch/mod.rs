//! Fetch capability: one HTTP GET of a URL with query parameters.
//!
//! The scheduler only depends on the [`Fetch`] trait. [`CurlFetcher`] is the
//! production implementation built on the curl crate (libcurl).

mod curl_fetcher;
mod error;

pub use curl_fetcher::{build_url, CurlFetcher};
pub use error::FetchError;

use std::collections::BTreeMap;
use std::time::Duration;

/// Query parameters, kept ordered so request URLs are stable in logs and tests.
pub type QueryParams = BTreeMap<String, String>;

/// Blocking fetch of a URL. Implementations must be shareable across worker tasks;
/// callers run them on the blocking pool.
pub trait Fetch: Send + Sync + 'static {
    fn fetch(&self, url: &str, params: &QueryParams, timeout: Duration)
        -> Result<Vec<u8>, FetchError>;
}
