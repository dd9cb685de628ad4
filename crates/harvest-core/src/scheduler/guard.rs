//! RAII guard that keeps the scheduler's live-task count honest.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

/// Decrements the live-task count when dropped (even if the task panicked)
/// and wakes `wait_idle` callers when it reaches zero.
pub(super) struct ActiveGuard<'a> {
    pub(super) active: &'a AtomicUsize,
    pub(super) idle: &'a Notify,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        if self.active.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }
}
