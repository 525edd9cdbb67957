// src/persist.rs
//! Saves the durable part of the app state (configs, timestamps, enabled
//! sources and the session) as JSON between restarts. Logs and the scan
//! status are never persisted.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use crate::session::SessionState;

pub const DEFAULT_STATE_PATH: &str = "state/freedom_guard.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PersistedState {
    #[serde(default)]
    pub configs: Vec<String>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    /// `None` when never saved, so first start enables the whole catalog.
    #[serde(default)]
    pub enabled_sources: Option<Vec<String>>,
    #[serde(default)]
    pub session: SessionState,
}

/// Read the state file. Missing or unreadable files yield defaults.
pub async fn load(path: &Path) -> PersistedState {
    match fs::read_to_string(path).await {
        Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), "state file unreadable, starting fresh: {e:#}");
            PersistedState::default()
        }),
        Err(_) => PersistedState::default(),
    }
}

/// Write via a sibling temp file + rename so readers never see a torn file.
pub async fn save(path: &Path, state: &PersistedState) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating state dir {}", dir.display()))?;
    }
    let body = serde_json::to_vec_pretty(state).context("serializing state")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body)
        .await
        .with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .await
        .with_context(|| format!("renaming {} into place", tmp.display()))?;
    Ok(())
}
