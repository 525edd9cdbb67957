//! Client session: picks the first aggregated config as the active one.
//!
//! `connect` always rescans first so the chosen config comes from fresh data.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::ingest::types::{Source, SourceFetcher};
use crate::ingest::{run_scan, ScanOutcome};
use crate::store::{ConfigStore, Status};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub connected: bool,
    pub current_config: Option<String>,
    pub bytes_transferred: u64,
}

#[derive(Debug, Default)]
pub struct Session {
    inner: Mutex<SessionState>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restored(state: SessionState) -> Self {
        Self {
            inner: Mutex::new(state),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.inner.lock().expect("session mutex poisoned").clone()
    }

    /// Scan, then activate the first config. Returns `false` if a scan is
    /// already running or the scan found nothing.
    pub async fn connect(
        &self,
        store: &ConfigStore,
        catalog: &[Source],
        enabled: &[String],
        fetcher: &dyn SourceFetcher,
    ) -> bool {
        if store.status() == Status::Scanning {
            return false;
        }
        if run_scan(store, catalog, enabled, fetcher).await != ScanOutcome::Finished(Status::Success) {
            return false;
        }
        let Some(first) = store.configs().into_iter().next() else {
            return false;
        };

        let label = describe(&first);
        {
            let mut st = self.inner.lock().expect("session mutex poisoned");
            st.connected = true;
            st.current_config = Some(first);
            st.bytes_transferred = 0;
        }
        store.mark_idle();
        store.log_success(format!("Connected using {label}."));
        tracing::info!(config = %label, "session connected");
        true
    }

    pub fn disconnect(&self, store: &ConfigStore) {
        {
            let mut st = self.inner.lock().expect("session mutex poisoned");
            *st = SessionState::default();
        }
        store.log_info("Disconnected.");
        store.mark_idle();
        tracing::info!("session disconnected");
    }

    /// Add to the transfer counter while connected; returns the new total.
    pub fn record_transfer(&self, bytes: u64) -> u64 {
        let mut st = self.inner.lock().expect("session mutex poisoned");
        if st.connected {
            st.bytes_transferred = st.bytes_transferred.saturating_add(bytes);
        }
        st.bytes_transferred
    }
}

/// First line of a config, shortened for log messages.
fn describe(config: &str) -> String {
    let line = config.lines().next().unwrap_or_default();
    let line = line.trim_start_matches("# ");
    if line.chars().count() > 48 {
        let head: String = line.chars().take(48).collect();
        format!("{head}…")
    } else {
        line.to_string()
    }
}
