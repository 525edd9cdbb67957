use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::config::AppConfig;
use crate::ingest::config::load_sources_default;
use crate::ingest::providers::HttpFetcher;
use crate::ingest::types::{Source, SourceFetcher};
use crate::ingest::{run_scan, ScanOutcome};
use crate::metrics::Metrics;
use crate::persist::{self, PersistedState};
use crate::proxy;
use crate::session::{Session, SessionState};
use crate::settings::SourceSettings;
use crate::store::{ConfigStore, Snapshot, Status};

#[derive(Clone)]
pub struct AppState {
    pub store: ConfigStore,
    pub catalog: Arc<Vec<Source>>,
    pub settings: Arc<RwLock<SourceSettings>>,
    pub session: Arc<Session>,
    pub fetcher: Arc<dyn SourceFetcher>,
    pub proxy_client: reqwest::Client,
    /// `None` keeps everything in memory.
    pub state_path: Option<PathBuf>,
    pub metrics: Option<Metrics>,
}

impl AppState {
    /// In-memory state with every catalog source enabled.
    pub fn new(catalog: Vec<Source>, fetcher: Arc<dyn SourceFetcher>) -> Self {
        let settings = SourceSettings::all_enabled(&catalog);
        Self {
            store: ConfigStore::new(),
            catalog: Arc::new(catalog),
            settings: Arc::new(RwLock::new(settings)),
            session: Arc::new(Session::new()),
            fetcher,
            proxy_client: reqwest::Client::new(),
            state_path: None,
            metrics: None,
        }
    }

    /// Build the production state: catalog from config, persisted results
    /// restored, HTTP fetcher and (optionally) Prometheus metrics.
    pub async fn bootstrap(cfg: &AppConfig) -> anyhow::Result<Self> {
        let catalog = load_sources_default()?;

        let mut fetcher = HttpFetcher::new(cfg.fetch_timeout, &cfg.user_agent)?;
        if let Some(base) = &cfg.proxy_base {
            fetcher = fetcher.with_proxy_base(base.clone());
        }
        let proxy_client = reqwest::Client::builder()
            .user_agent(cfg.user_agent.as_str())
            .timeout(cfg.fetch_timeout)
            .build()?;

        let saved = persist::load(&cfg.state_path).await;
        let settings = match saved.enabled_sources {
            Some(ids) => SourceSettings::from_ids(ids, &catalog),
            None => SourceSettings::all_enabled(&catalog),
        };
        tracing::info!(
            sources = catalog.len(),
            enabled = settings.enabled_ids().len(),
            restored_configs = saved.configs.len(),
            "app state ready"
        );

        Ok(Self {
            store: ConfigStore::restored(saved.configs, saved.last_updated),
            catalog: Arc::new(catalog),
            settings: Arc::new(RwLock::new(settings)),
            session: Arc::new(Session::restored(saved.session)),
            fetcher: Arc::new(fetcher),
            proxy_client,
            state_path: Some(cfg.state_path.clone()),
            metrics: if cfg.metrics_enabled {
                Some(Metrics::init()?)
            } else {
                None
            },
        })
    }

    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = Some(path.into());
        self
    }

    pub fn enabled_ids(&self) -> Vec<String> {
        self.settings
            .read()
            .expect("rwlock poisoned")
            .enabled_ids()
            .to_vec()
    }

    /// Runs on its own task, so a dropped request cannot cancel the scan.
    pub async fn scan(&self) -> ScanOutcome {
        let this = self.clone();
        let task = tokio::spawn(async move {
            let enabled = this.enabled_ids();
            let outcome =
                run_scan(&this.store, &this.catalog, &enabled, this.fetcher.as_ref()).await;
            this.persist().await;
            outcome
        });
        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("scan task failed: {e}");
                ScanOutcome::Finished(Status::Error)
            }
        }
    }

    pub async fn connect(&self) -> bool {
        let this = self.clone();
        let task = tokio::spawn(async move {
            let enabled = this.enabled_ids();
            let ok = this
                .session
                .connect(&this.store, &this.catalog, &enabled, this.fetcher.as_ref())
                .await;
            this.persist().await;
            ok
        });
        match task.await {
            Ok(ok) => ok,
            Err(e) => {
                tracing::error!("connect task failed: {e}");
                false
            }
        }
    }

    pub fn persisted(&self) -> PersistedState {
        let snap = self.store.snapshot();
        PersistedState {
            configs: snap.configs,
            last_updated: snap.last_updated,
            enabled_sources: Some(self.enabled_ids()),
            session: self.session.snapshot(),
        }
    }

    /// Best effort; failures are logged.
    pub async fn persist(&self) {
        let Some(path) = &self.state_path else {
            return;
        };
        if let Err(e) = persist::save(path, &self.persisted()).await {
            tracing::warn!(path = %path.display(), "persist state: {e:#}");
        }
    }

    fn source_views(&self) -> Vec<SourceView> {
        let settings = self.settings.read().expect("rwlock poisoned");
        self.catalog
            .iter()
            .map(|s| SourceView::new(s, settings.is_enabled(&s.id)))
            .collect()
    }
}

pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/state", get(get_state))
        .route("/api/scan", post(post_scan))
        .route("/api/clear", post(post_clear))
        .route("/api/sources", get(get_sources))
        .route("/api/sources/reset", post(reset_sources))
        .route("/api/sources/{id}/toggle", post(toggle_source))
        .route("/api/session", get(get_session))
        .route("/api/session/transfer", post(post_transfer))
        .route("/api/connect", post(post_connect))
        .route("/api/disconnect", post(post_disconnect))
        .route("/api/proxy", get(proxy::proxy));

    if let Some(m) = &state.metrics {
        app = app.merge(m.router());
    }

    app.layer(CorsLayer::very_permissive()).with_state(state)
}

#[derive(serde::Serialize)]
struct SourceView {
    id: String,
    display_name: String,
    url: String,
    enabled: bool,
}

impl SourceView {
    fn new(s: &Source, enabled: bool) -> Self {
        Self {
            id: s.id.clone(),
            display_name: s.display_name.clone(),
            url: s.url.clone(),
            enabled,
        }
    }
}

#[derive(serde::Serialize)]
struct ScanResp {
    started: bool,
    #[serde(flatten)]
    snapshot: Snapshot,
}

#[derive(serde::Deserialize)]
struct TransferReq {
    bytes: u64,
}

#[derive(serde::Serialize)]
struct ConnectResp {
    connected: bool,
    session: SessionState,
}

async fn get_state(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.store.snapshot())
}

async fn post_scan(State(state): State<AppState>) -> Response {
    let outcome = state.scan().await;
    let started = outcome != ScanOutcome::AlreadyScanning;
    let code = if started {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    };
    let body = ScanResp {
        started,
        snapshot: state.store.snapshot(),
    };
    (code, Json(body)).into_response()
}

async fn post_clear(State(state): State<AppState>) -> Response {
    if !state.store.clear_configs() {
        return (StatusCode::CONFLICT, Json(state.store.snapshot())).into_response();
    }
    state.persist().await;
    Json(state.store.snapshot()).into_response()
}

async fn get_sources(State(state): State<AppState>) -> Json<Vec<SourceView>> {
    Json(state.source_views())
}

async fn toggle_source(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(source) = state.catalog.iter().find(|s| s.id == id) else {
        return (StatusCode::NOT_FOUND, format!("unknown source '{id}'")).into_response();
    };
    let enabled = state
        .settings
        .write()
        .expect("rwlock poisoned")
        .toggle(&source.id);
    tracing::info!(source = %source.id, enabled, "source toggled");
    state.persist().await;
    Json(SourceView::new(source, enabled)).into_response()
}

async fn reset_sources(State(state): State<AppState>) -> Json<Vec<SourceView>> {
    state
        .settings
        .write()
        .expect("rwlock poisoned")
        .reset(&state.catalog);
    state.persist().await;
    Json(state.source_views())
}

async fn get_session(State(state): State<AppState>) -> Json<SessionState> {
    Json(state.session.snapshot())
}

/// 409 when no session is connected; the counter only moves while connected.
async fn post_transfer(State(state): State<AppState>, Json(req): Json<TransferReq>) -> Response {
    if !state.session.snapshot().connected {
        return (StatusCode::CONFLICT, Json(state.session.snapshot())).into_response();
    }
    let total = state.session.record_transfer(req.bytes);
    tracing::debug!(bytes = req.bytes, total, "transfer recorded");
    state.persist().await;
    Json(state.session.snapshot()).into_response()
}

async fn post_connect(State(state): State<AppState>) -> Json<ConnectResp> {
    let connected = state.connect().await;
    Json(ConnectResp {
        connected,
        session: state.session.snapshot(),
    })
}

async fn post_disconnect(State(state): State<AppState>) -> Json<SessionState> {
    state.session.disconnect(&state.store);
    state.persist().await;
    Json(state.session.snapshot())
}
