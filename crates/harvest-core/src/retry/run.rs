//! Retry loop: run a closure until success or the policy says stop.

use std::fmt::Display;

use super::policy::{RetryDecision, RetryPolicy};

/// Runs `f` until it succeeds or the policy gives up, returning the last error.
/// Blocks the current thread while waiting; call from `spawn_blocking` in async code.
pub fn run_with_retry<T, E, F>(policy: &RetryPolicy, mut f: F) -> Result<T, E>
where
    E: Display,
    F: FnMut(u32) -> Result<T, E>,
{
    let mut attempt = 1u32;
    loop {
        match f(attempt) {
            Ok(v) => return Ok(v),
            Err(e) => match policy.decide(attempt) {
                RetryDecision::NoRetry => return Err(e),
                RetryDecision::RetryAfter(d) => {
                    tracing::warn!(attempt, "fetch failed, retrying: {}", e);
                    if !d.is_zero() {
                        std::thread::sleep(d);
                    }
                    attempt += 1;
                }
            },
        }
    }
}
