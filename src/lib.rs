// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod event_log;
pub mod ingest;
pub mod metrics;
pub mod persist;
pub mod proxy;
pub mod session;
pub mod settings;
pub mod store;
pub mod subscription;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::event_log::{LogEntry, LogKind};
pub use crate::ingest::{run_scan, ScanOutcome};
pub use crate::store::{ConfigStore, Snapshot, Status};
pub use crate::subscription::{decode, extract, ConfigRecord};
