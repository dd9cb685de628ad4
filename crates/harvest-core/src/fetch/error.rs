//! Fetch error type.

/// Error returned by a single fetch attempt. All variants are retried by the worker.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Endpoint could not be turned into a request URL.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    /// Anything else an alternative transport reports.
    #[error("{0}")]
    Other(String),
}
