//! FreedomGuard: Binary Entrypoint
//! Boots the Axum HTTP server: subscription scans, source settings, session
//! and the pass-through proxy.

use freedom_guard::{api, config::AppConfig, AppState};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing logs, filtered by `RUST_LOG`.
/// Activation requires FG_DEV_LOG=1 or a debug build; the hosting runtime
/// keeps its own subscriber otherwise.
fn enable_dev_tracing() {
    let dev_flag = std::env::var("FG_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    if !(dev_flag || cfg!(debug_assertions)) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("freedom_guard=info,warn"));

    // The runtime may already have installed a global subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let cfg = AppConfig::from_env();
    let state = AppState::bootstrap(&cfg).await?;
    let router = api::router(state);

    Ok(router.into())
}
