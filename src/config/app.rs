// src/config/app.rs
use std::path::PathBuf;
use std::time::Duration;

use crate::ingest::providers::DEFAULT_USER_AGENT;
use crate::persist::DEFAULT_STATE_PATH;

pub const ENV_STATE_PATH: &str = "FG_STATE_PATH";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "FG_FETCH_TIMEOUT_SECS";
pub const ENV_PROXY_BASE: &str = "FG_PROXY_BASE";
pub const ENV_USER_AGENT: &str = "FG_USER_AGENT";
pub const ENV_METRICS: &str = "FG_METRICS";

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;

/// Runtime settings read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub state_path: PathBuf,
    pub fetch_timeout: Duration,
    /// Fetch subscriptions through `{proxy_base}/api/proxy` instead of directly.
    pub proxy_base: Option<String>,
    pub user_agent: String,
    pub metrics_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            proxy_base: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            metrics_enabled: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        let non_empty = |k: &str| {
            std::env::var(k)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let fetch_timeout = non_empty(ENV_FETCH_TIMEOUT_SECS)
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&s| s > 0)
            .map(Duration::from_secs)
            .unwrap_or(d.fetch_timeout);

        Self {
            state_path: non_empty(ENV_STATE_PATH)
                .map(PathBuf::from)
                .unwrap_or(d.state_path),
            fetch_timeout,
            proxy_base: non_empty(ENV_PROXY_BASE),
            user_agent: non_empty(ENV_USER_AGENT).unwrap_or(d.user_agent),
            metrics_enabled: non_empty(ENV_METRICS).is_some_and(|v| v == "1"),
        }
    }
}
