// src/ingest/mod.rs
pub mod config;
pub mod providers;
pub mod types;

use crate::ingest::types::{RawPayload, Source, SourceFetcher};
use crate::store::{ConfigStore, Status};
use crate::subscription::classify_and_extract;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use std::collections::HashSet;

pub const MSG_INIT: &str = "Initializing FreedomGuard sequence...";
pub const MSG_NO_SOURCES: &str = "No sources enabled. Please enable sources in Settings.";
pub const MSG_SCAN_FAILED: &str =
    "Scan failed. No configurations found. Check network or try again later.";
pub const MSG_SCAN_INTERRUPTED: &str = "Scan interrupted before it finished.";

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("scan_runs_total", "Scans started.");
        describe_counter!(
            "scan_source_errors_total",
            "Source fetch failures (transport or HTTP status)."
        );
        describe_counter!(
            "scan_interrupted_total",
            "Scans dropped or panicked before reaching a terminal status."
        );
        describe_counter!(
            "scan_records_total",
            "Records extracted from payloads, before dedup."
        );
        describe_gauge!(
            "scan_unique_configs",
            "Unique configs produced by the last scan."
        );
        describe_histogram!("scan_parse_ms", "Payload parse time in milliseconds.");
        describe_gauge!("scan_last_run_ts", "Unix ts when the last scan finished.");
    });
}

/// Insertion-ordered set of trimmed config strings.
#[derive(Debug, Default)]
pub struct UniqueConfigs {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl UniqueConfigs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the trimmed value was not present yet.
    pub fn insert(&mut self, value: &str) -> bool {
        let t = value.trim();
        if t.is_empty() || !self.seen.insert(t.to_string()) {
            return false;
        }
        self.ordered.push(t.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.ordered
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Another scan held the store; nothing was changed.
    AlreadyScanning,
    /// The scan ran to a terminal status.
    Finished(Status),
}

/// Holds a started scan. Dropping it unfinished (cancelled future or a panic
/// in a fetcher) moves the store to `Error`, keeping prior configs.
struct ScanGuard<'a> {
    store: &'a ConfigStore,
    finished: bool,
}

impl<'a> ScanGuard<'a> {
    fn new(store: &'a ConfigStore) -> Self {
        Self {
            store,
            finished: false,
        }
    }

    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        counter!("scan_interrupted_total").increment(1);
        self.store.log_error(MSG_SCAN_INTERRUPTED);
        self.store.abort_scan();
        tracing::warn!(target: "ingest", "scan dropped before completion");
    }
}

/// Catalog entries whose id is in `enabled`, in catalog order.
pub fn active_sources<'a>(catalog: &'a [Source], enabled: &[String]) -> Vec<&'a Source> {
    catalog
        .iter()
        .filter(|s| enabled.iter().any(|id| id == &s.id))
        .collect()
}

/// Run one scan across the enabled sources and record the result in `store`.
///
/// Per-source failures are logged and skipped. The scan only ends in
/// `Status::Error` when no source is enabled or nothing was extracted at all.
pub async fn run_scan(
    store: &ConfigStore,
    catalog: &[Source],
    enabled: &[String],
    fetcher: &dyn SourceFetcher,
) -> ScanOutcome {
    ensure_metrics_described();

    if !store.try_begin_scan(MSG_INIT) {
        tracing::debug!(target: "ingest", "scan already in flight; ignoring start");
        return ScanOutcome::AlreadyScanning;
    }
    let guard = ScanGuard::new(store);
    counter!("scan_runs_total").increment(1);

    let active = active_sources(catalog, enabled);
    if active.is_empty() {
        guard.finish();
        store.log_error(MSG_NO_SOURCES);
        store.abort_scan();
        tracing::warn!(target: "ingest", "scan aborted: no enabled sources");
        return ScanOutcome::Finished(Status::Error);
    }

    let mut unique = UniqueConfigs::new();
    for source in active {
        scan_source(store, source, fetcher, &mut unique).await;
    }

    let now = chrono::Utc::now().timestamp().max(0) as u64;
    gauge!("scan_last_run_ts").set(now as f64);
    gauge!("scan_unique_configs").set(unique.len() as f64);

    guard.finish();
    if unique.is_empty() {
        store.fail_scan();
        store.log_error(MSG_SCAN_FAILED);
        tracing::warn!(target: "ingest", fetcher = fetcher.name(), "scan produced no configs");
        return ScanOutcome::Finished(Status::Error);
    }

    let total = unique.len();
    store.complete_scan(unique.into_vec());
    store.log_success(format!(
        "Scan complete. Total unique configs found: {total}"
    ));
    tracing::info!(target: "ingest", total, "scan complete");
    ScanOutcome::Finished(Status::Success)
}

async fn scan_source(
    store: &ConfigStore,
    source: &Source,
    fetcher: &dyn SourceFetcher,
    unique: &mut UniqueConfigs,
) {
    let name = source.display_name.as_str();
    store.log_info(format!("Pinging {name}..."));

    let resp = match fetcher.fetch(&source.url).await {
        Ok(r) if r.is_success() => r,
        Ok(r) => {
            tracing::warn!(target: "ingest", source = %source.id, status = r.status, "source http error");
            counter!("scan_source_errors_total").increment(1);
            store.log_error(format!("Failed to fetch from {name} (HTTP {}).", r.status));
            return;
        }
        Err(e) => {
            tracing::warn!(target: "ingest", source = %source.id, error = ?e, "source fetch error");
            counter!("scan_source_errors_total").increment(1);
            store.log_error(format!("Failed to fetch from {name}."));
            return;
        }
    };

    let payload = RawPayload {
        source_id: source.id.clone(),
        body: resp.body,
        fetched_at: chrono::Utc::now(),
    };
    store.log_info(format!("Response received from {name}. Parsing..."));

    let t0 = std::time::Instant::now();
    let (format, records) = classify_and_extract(&payload.body);
    histogram!("scan_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    counter!("scan_records_total").increment(records.len() as u64);

    tracing::debug!(
        target: "ingest",
        source = %payload.source_id,
        fetched_at = %payload.fetched_at,
        bytes = payload.body.len(),
        ?format,
        records = records.len(),
        "payload parsed"
    );

    if records.is_empty() {
        store.log_info(format!("No valid configs found in {name}."));
        return;
    }
    for r in &records {
        unique.insert(&r.render());
    }
    store.log_success(format!("Found {} configs from {name}.", records.len()));
}
