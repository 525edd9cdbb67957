//! # Config Store
//! Owned aggregate state for scan runs: status, the ordered unique config list,
//! the event log and the time of the last successful scan.
//!
//! Readers either take a [`Snapshot`] or [`ConfigStore::subscribe`] to a
//! `watch` channel that receives a fresh snapshot after every mutation.
//!
//! Transitions:
//! - `Idle | Success | Error → Scanning` via [`ConfigStore::try_begin_scan`]
//!   (refused while already `Scanning`)
//! - `Scanning → Success` via [`ConfigStore::complete_scan`]
//! - `Scanning → Error` via [`ConfigStore::abort_scan`] / [`ConfigStore::fail_scan`]
//! - `Success | Error → Idle` via [`ConfigStore::clear_configs`] / [`ConfigStore::mark_idle`]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::event_log::{EventLog, LogEntry, LogKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    #[default]
    Idle,
    Scanning,
    Success,
    Error,
}

/// Read-only view handed to display surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Snapshot {
    pub status: Status,
    pub configs: Vec<String>,
    pub logs: Vec<LogEntry>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct StoreState {
    status: Status,
    configs: Vec<String>,
    last_updated: Option<DateTime<Utc>>,
}

struct Inner {
    state: Mutex<StoreState>,
    log: EventLog,
    tx: watch::Sender<Snapshot>,
}

/// Cheap to clone; all clones share one state.
#[derive(Clone)]
pub struct ConfigStore {
    inner: Arc<Inner>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::restored(Vec::new(), None)
    }

    /// Start from previously persisted results. The store begins `Idle`.
    pub fn restored(configs: Vec<String>, last_updated: Option<DateTime<Utc>>) -> Self {
        let state = StoreState {
            status: Status::Idle,
            configs,
            last_updated,
        };
        let (tx, _rx) = watch::channel(Snapshot {
            status: state.status,
            configs: state.configs.clone(),
            logs: Vec::new(),
            last_updated: state.last_updated,
        });
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                log: EventLog::new(),
                tx,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.inner.tx.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        let st = self.lock();
        self.build_snapshot(&st)
    }

    pub fn status(&self) -> Status {
        self.lock().status
    }

    pub fn configs(&self) -> Vec<String> {
        self.lock().configs.clone()
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        self.inner.log.snapshot()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.lock().last_updated
    }

    pub fn log(&self, kind: LogKind, message: impl Into<String>) {
        let st = self.lock();
        self.inner.log.push(message, kind);
        self.publish(&st);
    }

    pub fn log_info(&self, message: impl Into<String>) {
        self.log(LogKind::Info, message);
    }

    pub fn log_success(&self, message: impl Into<String>) {
        self.log(LogKind::Success, message);
    }

    pub fn log_error(&self, message: impl Into<String>) {
        self.log(LogKind::Error, message);
    }

    /// Enter `Scanning`, clear the log and record `init_message`.
    ///
    /// Returns `false` and touches nothing if a scan is already running.
    pub fn try_begin_scan(&self, init_message: &str) -> bool {
        let mut st = self.lock();
        if st.status == Status::Scanning {
            return false;
        }
        st.status = Status::Scanning;
        self.inner.log.clear();
        self.inner.log.info(init_message);
        self.publish(&st);
        true
    }

    /// `Scanning → Success`: replace the config list and stamp the time.
    pub fn complete_scan(&self, configs: Vec<String>) {
        let mut st = self.lock();
        st.status = Status::Success;
        st.configs = configs;
        st.last_updated = Some(Utc::now());
        self.publish(&st);
    }

    /// `Scanning → Error` leaving previously held configs in place.
    pub fn abort_scan(&self) {
        let mut st = self.lock();
        st.status = Status::Error;
        self.publish(&st);
    }

    /// `Scanning → Error` discarding previously held configs.
    pub fn fail_scan(&self) {
        let mut st = self.lock();
        st.status = Status::Error;
        st.configs.clear();
        st.last_updated = None;
        self.publish(&st);
    }

    /// Drop held configs and return to `Idle`. Refused while scanning.
    pub fn clear_configs(&self) -> bool {
        let mut st = self.lock();
        if st.status == Status::Scanning {
            return false;
        }
        self.inner.log.info("Configuration cache cleared.");
        st.configs.clear();
        st.last_updated = None;
        st.status = Status::Idle;
        self.publish(&st);
        true
    }

    /// Acknowledge a finished scan (`Success | Error → Idle`), keeping configs.
    pub fn mark_idle(&self) -> bool {
        let mut st = self.lock();
        if st.status == Status::Scanning {
            return false;
        }
        st.status = Status::Idle;
        self.publish(&st);
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.inner.state.lock().expect("config store mutex poisoned")
    }

    fn build_snapshot(&self, st: &StoreState) -> Snapshot {
        Snapshot {
            status: st.status,
            configs: st.configs.clone(),
            logs: self.inner.log.snapshot(),
            last_updated: st.last_updated,
        }
    }

    // Called with the state lock held so published snapshots follow mutation order.
    fn publish(&self, st: &StoreState) {
        self.inner.tx.send_replace(self.build_snapshot(st));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_scan_is_refused_while_scanning() {
        let store = ConfigStore::new();
        assert!(store.try_begin_scan("init"));
        store.log_info("pinging");
        let before = store.snapshot();

        assert!(!store.try_begin_scan("init again"));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn begin_scan_clears_previous_log() {
        let store = ConfigStore::new();
        store.log_info("stale");
        assert!(store.try_begin_scan("init"));
        let logs = store.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].message, "init");
    }

    #[test]
    fn fail_discards_but_abort_keeps_configs() {
        let store = ConfigStore::restored(vec!["vless://old".into()], Some(Utc::now()));
        assert!(store.try_begin_scan("init"));
        store.abort_scan();
        assert_eq!(store.status(), Status::Error);
        assert_eq!(store.configs(), vec!["vless://old".to_string()]);

        assert!(store.try_begin_scan("init"));
        store.fail_scan();
        assert_eq!(store.status(), Status::Error);
        assert!(store.configs().is_empty());
        assert!(store.last_updated().is_none());
    }

    #[test]
    fn clear_returns_to_idle() {
        let store = ConfigStore::new();
        assert!(store.try_begin_scan("init"));
        assert!(!store.clear_configs());
        store.complete_scan(vec!["trojan://a".into()]);
        assert_eq!(store.status(), Status::Success);
        assert!(store.last_updated().is_some());

        assert!(store.clear_configs());
        let snap = store.snapshot();
        assert_eq!(snap.status, Status::Idle);
        assert!(snap.configs.is_empty());
        assert_eq!(snap.logs.last().unwrap().message, "Configuration cache cleared.");
    }

    #[test]
    fn subscribers_see_latest_snapshot() {
        let store = ConfigStore::new();
        let mut rx = store.subscribe();
        assert!(store.try_begin_scan("init"));
        store.complete_scan(vec!["vmess://x".into()]);
        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.status, Status::Success);
        assert_eq!(seen.configs, vec!["vmess://x".to_string()]);
    }
}
