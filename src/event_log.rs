//! event_log.rs: ordered, append-only progress log shown to the user during a scan.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique for the lifetime of the log, including across clears.
    pub id: u64,
    pub message: String,
    pub kind: LogKind,
}

#[derive(Debug, Default)]
pub struct EventLog {
    inner: Mutex<Vec<LogEntry>>,
    next_id: AtomicU64,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, message: impl Into<String>, kind: LogKind) -> u64 {
        let message = message.into();
        let mut v = self.inner.lock().expect("event log mutex poisoned");
        // Taken under the lock so ids ascend in append order.
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        v.push(LogEntry { id, message, kind });
        id
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.push(message, LogKind::Info)
    }

    /// Drop all entries. Ids keep counting up.
    pub fn clear(&self) {
        self.inner.lock().expect("event log mutex poisoned").clear();
    }

    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.inner.lock().expect("event log mutex poisoned").clone()
    }
}
