//! Logging init: append to a file under the XDG state dir, or to stderr.
//!
//! The live worker table owns stdout during a run, so logs never go there.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,harvest_core=debug,harvest=debug";

/// `RUST_LOG` if set, otherwise the crate defaults.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn install<W>(writer: W) -> Result<()>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install tracing subscriber: {}", e))
}

/// Log to `~/.local/state/harvest/harvest.log` and return its path.
///
/// Errors if the state dir is unwritable or a subscriber is already set; the
/// caller falls back to [`init_logging_stderr`].
pub fn init_logging() -> Result<PathBuf> {
    let dirs = xdg::BaseDirectories::with_prefix("harvest")?;
    let dir = dirs.get_state_home();
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;

    let path = dir.join("harvest.log");
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open {}", path.display()))?;

    // `&File` is a writer, so a shared handle serves every event.
    install(Arc::new(file))?;
    tracing::info!(path = %path.display(), "logging initialized");
    Ok(path)
}

/// Log to stderr only.
pub fn init_logging_stderr() -> Result<()> {
    install(std::io::stderr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_subscriber_is_reported() {
        // Whichever install runs first in this process wins; a repeat must fail.
        let _ = init_logging_stderr();
        assert!(init_logging_stderr().is_err());
    }
}
