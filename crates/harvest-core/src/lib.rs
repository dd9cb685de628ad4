pub mod api;
pub mod config;
pub mod conversion;
pub mod failures;
pub mod fetch;
pub mod logging;
pub mod partition;
pub mod retry;
pub mod scheduler;
pub mod store;
pub mod worker;

#[cfg(test)]
mod testing;
