use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::ingest::types::{FetchResponse, SourceFetcher};

pub const DEFAULT_USER_AGENT: &str = "FreedomGuard/1.0";

/// Fetches subscription bodies over HTTP(S), either directly or through a
/// pass-through proxy exposing `GET {base}/api/proxy?url=...`.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    proxy_base: Option<String>,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("building http client")?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            proxy_base: None,
        }
    }

    pub fn with_proxy_base(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.proxy_base = Some(base.trim_end_matches('/').to_string());
        self
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        let req = match &self.proxy_base {
            Some(base) => self
                .client
                .get(format!("{base}/api/proxy"))
                .query(&[("url", url)]),
            None => self.client.get(url),
        };
        let resp = req
            .send()
            .await
            .with_context(|| format!("http get {url}"))?;
        let status = resp.status().as_u16();
        let body = resp.text().await.context("http .text()")?;
        Ok(FetchResponse { status, body })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
