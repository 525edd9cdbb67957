// tests/common/mod.rs
#![allow(dead_code)]

use axum::{http::StatusCode, routing::get, Router};
use freedom_guard::ingest::types::Source;

/// Local upstream serving a few canned subscription bodies.
/// Returns the base URL, e.g. `http://127.0.0.1:54321`.
pub async fn spawn_upstream() -> String {
    let app = Router::new()
        .route(
            "/sub",
            get(|| async { ([("content-type", "text/plain"), ("x-upstream", "yes")], "vless://abc\ntrojan://def\n") }),
        )
        .route(
            "/missing",
            get(|| async { (StatusCode::NOT_FOUND, "nope") }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind upstream");
    let addr = listener.local_addr().expect("upstream addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve upstream");
    });
    format!("http://{addr}")
}

/// Client that ignores HTTP_PROXY & co. so loopback requests stay local.
pub fn direct_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("build reqwest client")
}

pub fn catalog() -> Vec<Source> {
    vec![
        Source::new("alpha", "Alpha Feed", "https://alpha.test/sub"),
        Source::new("beta", "Beta Feed", "https://beta.test/sub"),
        Source::new("gamma", "Gamma Feed", "https://gamma.test/sub"),
    ]
}

pub fn ids(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}
