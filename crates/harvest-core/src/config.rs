use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::partition::PAGE_LIMIT;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of fetch attempts per page (including the first).
    pub max_attempts: u32,
    /// Delay in milliseconds before the second attempt; 0 retries immediately.
    pub delay_millis: u64,
    /// Maximum delay in seconds between attempts.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_millis: 0,
            max_delay_secs: 30,
        }
    }
}

/// Reporting API endpoint and credentials. Credentials are passed through as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API host, e.g. `itunes-api.performancehorizon.com`.
    pub host: String,
    /// Publisher the conversions are reported for.
    pub publisher_id: String,
    /// Basic-auth user part.
    #[serde(default)]
    pub app_key: String,
    /// Basic-auth password part.
    #[serde(default)]
    pub api_key: String,
    /// Account token stamped on every stored conversion.
    pub atoken: String,
    /// Currency the API converts values into.
    pub convert_currency: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "itunes-api.performancehorizon.com".to_string(),
            publisher_id: "1010l19090".to_string(),
            app_key: String::new(),
            api_key: String::new(),
            atoken: "1001lpy5".to_string(),
            convert_currency: "USD".to_string(),
        }
    }
}

/// Global configuration loaded from `~/.config/harvest/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Number of workers the window is split into.
    pub workers: usize,
    /// Page size requested from the API.
    pub page_limit: u32,
    /// Upper bound for a single fetch call, in seconds.
    pub fetch_timeout_secs: u64,
    /// A running worker whose last record trails its job end by more than this
    /// many seconds is a candidate for rebalancing.
    pub lag_threshold_secs: i64,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub api: ApiConfig,
    /// Optional SQLite database path (None = `~/.local/state/harvest/conversions.db`).
    #[serde(default)]
    pub database: Option<PathBuf>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            page_limit: PAGE_LIMIT,
            fetch_timeout_secs: 90,
            lag_threshold_secs: 3600,
            retry: None,
            api: ApiConfig::default(),
            database: None,
        }
    }
}

impl HarvestConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    pub fn lag_threshold(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.lag_threshold_secs.max(0))
    }

    /// Retry section, or defaults when absent.
    pub fn retry_or_default(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("harvest")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Unix socket a running `harvest run` listens on (`~/.local/state/harvest/control.sock`).
pub fn control_socket_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("harvest")?;
    Ok(xdg_dirs.place_state_file("control.sock")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<HarvestConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = HarvestConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: HarvestConfig = toml::from_str(&data)?;
    Ok(cfg)
}
