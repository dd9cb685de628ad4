//! Retry policy for page fetches.
//!
//! Every error returned by the fetch capability is treated as transient; the
//! policy only bounds the number of attempts and the pause between them.

mod policy;
mod run;

pub use policy::{RetryDecision, RetryPolicy};
pub use run::run_with_retry;
