// src/proxy.rs
//! Pass-through fetch used by browser clients that cannot read subscription
//! hosts directly because of CORS. Forwards status, headers and body as-is.

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::api::AppState;

/// Headers that describe the upstream connection rather than the payload.
const HOP_BY_HOP: [&str; 5] = [
    "connection",
    "content-length",
    "keep-alive",
    "transfer-encoding",
    "upgrade",
];

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    url: Option<String>,
}

pub async fn proxy(State(state): State<AppState>, Query(q): Query<ProxyQuery>) -> Response {
    let Some(url) = q.url.filter(|u| !u.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "URL parameter is required" })),
        )
            .into_response();
    };

    match forward(&state.proxy_client, url.trim()).await {
        Ok(resp) => resp,
        Err(e) => {
            tracing::warn!(target: "proxy", %url, "proxy upstream failed: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "Internal proxy error" })),
            )
                .into_response()
        }
    }
}

async fn forward(client: &reqwest::Client, url: &str) -> Result<Response> {
    let upstream = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("proxy get {url}"))?;

    let status = StatusCode::from_u16(upstream.status().as_u16()).context("upstream status")?;
    let mut headers = HeaderMap::new();
    for (name, value) in upstream.headers() {
        if !HOP_BY_HOP.contains(&name.as_str()) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );

    let body = upstream.bytes().await.context("proxy read body")?;
    tracing::debug!(target: "proxy", %url, status = status.as_u16(), bytes = body.len(), "proxied");
    Ok((status, headers, body).into_response())
}
