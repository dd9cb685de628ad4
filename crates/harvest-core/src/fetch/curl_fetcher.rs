//! GET via libcurl with a per-call timeout.

use std::time::Duration;

use super::error::FetchError;
use super::{Fetch, QueryParams};

/// Appends `params` to `base` as a URL-encoded query string.
pub fn build_url(base: &str, params: &QueryParams) -> Result<String, FetchError> {
    let mut url = url::Url::parse(base)?;
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in params {
            pairs.append_pair(k, v);
        }
    }
    Ok(url.into())
}

/// Production fetcher. Basic-auth credentials travel in the URL userinfo.
#[derive(Debug, Clone, Default)]
pub struct CurlFetcher {
    connect_timeout: Option<Duration>,
}

impl CurlFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap connection setup separately from the whole-call timeout.
    pub fn with_connect_timeout(mut self, d: Duration) -> Self {
        self.connect_timeout = Some(d);
        self
    }
}

impl Fetch for CurlFetcher {
    fn fetch(
        &self,
        url: &str,
        params: &QueryParams,
        timeout: Duration,
    ) -> Result<Vec<u8>, FetchError> {
        let full = build_url(url, params)?;
        let mut body = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(&full)?;
        easy.get(true)?;
        easy.follow_location(true)?;
        easy.connect_timeout(self.connect_timeout.unwrap_or(timeout).min(timeout))?;
        easy.timeout(timeout)?;

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(FetchError::Http(code));
        }
        Ok(body)
    }
}
