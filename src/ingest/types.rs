// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Source {
    pub id: String,
    #[serde(default, alias = "name")]
    pub display_name: String,
    pub url: String,
}

impl Source {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            url: url.into(),
        }
    }
}

/// Body fetched for one source; dropped once records are extracted.
#[derive(Debug, Clone)]
pub struct RawPayload {
    pub source_id: String,
    pub body: String,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network boundary. A transport failure is `Err`; an HTTP error status is an
/// `Ok` response that the caller checks with [`FetchResponse::is_success`].
#[async_trait::async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResponse>;
    fn name(&self) -> &'static str;
}
