// tests/scan_runs.rs
//
// End-to-end scan runs against in-memory fetchers.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use freedom_guard::ingest::providers::FixtureFetcher;
use freedom_guard::ingest::types::{FetchResponse, SourceFetcher};
use freedom_guard::{run_scan, ConfigStore, LogKind, ScanOutcome, Status};
use tokio::sync::Notify;

use common::{catalog, ids};

#[tokio::test]
async fn failing_source_does_not_stop_the_scan() {
    let store = ConfigStore::new();
    let fetcher = FixtureFetcher::new()
        .with_error("https://alpha.test/sub", "connection refused")
        .with_body("https://beta.test/sub", "trojan://ok");

    let out = run_scan(&store, &catalog(), &ids(&["alpha", "beta"]), &fetcher).await;
    assert_eq!(out, ScanOutcome::Finished(Status::Success));

    let snap = store.snapshot();
    assert_eq!(snap.status, Status::Success);
    assert_eq!(snap.configs, vec!["trojan://ok".to_string()]);
    assert!(snap.last_updated.is_some());
    assert!(snap
        .logs
        .iter()
        .any(|e| e.kind == LogKind::Error && e.message.contains("Alpha Feed")));
    assert!(snap
        .logs
        .iter()
        .any(|e| e.kind == LogKind::Success && e.message == "Found 1 configs from Beta Feed."));
}

#[tokio::test]
async fn http_error_status_counts_as_fetch_failure() {
    let store = ConfigStore::new();
    let fetcher = FixtureFetcher::new().with_status("https://alpha.test/sub", 503, "vless://hidden");

    let out = run_scan(&store, &catalog(), &ids(&["alpha"]), &fetcher).await;
    assert_eq!(out, ScanOutcome::Finished(Status::Error));
    let logs = store.logs();
    assert!(logs.iter().any(|e| e.message.contains("HTTP 503")));
    assert!(store.configs().is_empty());
}

#[tokio::test]
async fn duplicates_across_sources_collapse() {
    let store = ConfigStore::new();
    let encoded = URL_SAFE_NO_PAD.encode("vless://abc\nvmess://zzz\n");
    let fetcher = FixtureFetcher::new()
        .with_body("https://alpha.test/sub", "vless://abc\n  vless://abc  \ntrojan://t")
        .with_body("https://beta.test/sub", encoded)
        .with_body("https://gamma.test/sub", "nothing useful here");

    run_scan(&store, &catalog(), &ids(&["alpha", "beta", "gamma"]), &fetcher).await;

    assert_eq!(
        store.configs(),
        vec!["vless://abc", "trojan://t", "vmess://zzz"]
    );
    let logs = store.logs();
    assert!(logs
        .iter()
        .any(|e| e.kind == LogKind::Info && e.message == "No valid configs found in Gamma Feed."));
    assert_eq!(
        logs.last().unwrap().message,
        "Scan complete. Total unique configs found: 3"
    );
}

#[tokio::test]
async fn no_enabled_sources_fails_without_fetching() {
    let store = ConfigStore::restored(vec!["vless://kept".into()], None);
    let fetcher = FixtureFetcher::new();

    let out = run_scan(&store, &catalog(), &[], &fetcher).await;
    assert_eq!(out, ScanOutcome::Finished(Status::Error));
    assert_eq!(fetcher.calls(), 0);
    assert_eq!(store.configs(), vec!["vless://kept".to_string()]);

    let logs = store.logs();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[1].kind, LogKind::Error);
}

#[tokio::test]
async fn empty_rescan_discards_previous_configs() {
    let store = ConfigStore::new();
    let good = FixtureFetcher::new().with_body("https://alpha.test/sub", "vmess://one");
    run_scan(&store, &catalog(), &ids(&["alpha"]), &good).await;
    assert_eq!(store.status(), Status::Success);

    let empty = FixtureFetcher::new().with_body("https://alpha.test/sub", "");
    let out = run_scan(&store, &catalog(), &ids(&["alpha"]), &empty).await;
    assert_eq!(out, ScanOutcome::Finished(Status::Error));
    assert!(store.configs().is_empty());
    assert!(store.last_updated().is_none());
}

#[tokio::test]
async fn profiles_take_priority_over_lines() {
    let store = ConfigStore::new();
    let payload = r#"[{"remarks":"One","note":"vless://x"},{"ps":"Two"}]"#;
    let fetcher = FixtureFetcher::new().with_body("https://alpha.test/sub", payload);

    run_scan(&store, &catalog(), &ids(&["alpha"]), &fetcher).await;
    let configs = store.configs();
    assert_eq!(configs.len(), 2);
    assert!(configs[0].starts_with("# One\n"));
    assert!(configs[1].starts_with("# Two\n"));
}

/// Blocks inside `fetch` until released, so a scan can be held in `Scanning`.
struct GatedFetcher {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl SourceFetcher for GatedFetcher {
    async fn fetch(&self, _url: &str) -> anyhow::Result<FetchResponse> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(FetchResponse::ok("vless://late"))
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

#[tokio::test]
async fn start_while_scanning_is_a_no_op() {
    let store = ConfigStore::new();
    let gated = Arc::new(GatedFetcher {
        entered: Notify::new(),
        release: Notify::new(),
    });

    let first = {
        let store = store.clone();
        let gated = gated.clone();
        tokio::spawn(async move {
            run_scan(&store, &catalog(), &ids(&["alpha"]), &*gated).await
        })
    };
    gated.entered.notified().await;
    assert_eq!(store.status(), Status::Scanning);
    let before = store.snapshot();

    let other = FixtureFetcher::new().with_body("https://alpha.test/sub", "vless://other");
    let second = run_scan(&store, &catalog(), &ids(&["alpha"]), &other).await;
    assert_eq!(second, ScanOutcome::AlreadyScanning);
    assert_eq!(other.calls(), 0);
    assert_eq!(store.snapshot(), before);

    gated.release.notify_one();
    assert_eq!(first.await.unwrap(), ScanOutcome::Finished(Status::Success));
    assert_eq!(store.configs(), vec!["vless://late".to_string()]);
}

/// Never answers, like an upstream that accepts the connection and stalls.
struct StalledFetcher;

#[async_trait]
impl SourceFetcher for StalledFetcher {
    async fn fetch(&self, _url: &str) -> anyhow::Result<FetchResponse> {
        std::future::pending().await
    }

    fn name(&self) -> &'static str {
        "stalled"
    }
}

#[tokio::test]
async fn dropped_scan_releases_the_store() {
    let store = ConfigStore::restored(vec!["vless://kept".into()], None);

    let cut = tokio::time::timeout(
        Duration::from_millis(50),
        run_scan(&store, &catalog(), &ids(&["alpha"]), &StalledFetcher),
    )
    .await;
    assert!(cut.is_err());

    assert_eq!(store.status(), Status::Error);
    assert_eq!(store.configs(), vec!["vless://kept".to_string()]);
    let last = store.logs().pop().unwrap();
    assert_eq!(last.kind, LogKind::Error);
    assert_eq!(last.message, "Scan interrupted before it finished.");

    let fetcher = FixtureFetcher::new().with_body("https://alpha.test/sub", "trojan://fresh");
    let out = run_scan(&store, &catalog(), &ids(&["alpha"]), &fetcher).await;
    assert_eq!(out, ScanOutcome::Finished(Status::Success));
    assert!(store.clear_configs());
}
