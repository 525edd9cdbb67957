use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::ingest::types::{FetchResponse, SourceFetcher};

enum Canned {
    Response(FetchResponse),
    TransportError(String),
}

/// In-memory fetcher keyed by URL. Unknown URLs fail like a refused connection.
#[derive(Default)]
pub struct FixtureFetcher {
    // Owned bodies, so tests can build fixtures from formatted strings.
    responses: HashMap<String, Canned>,
    calls: AtomicUsize,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses
            .insert(url.into(), Canned::Response(FetchResponse::ok(body)));
        self
    }

    pub fn with_status(mut self, url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        self.responses.insert(
            url.into(),
            Canned::Response(FetchResponse {
                status,
                body: body.into(),
            }),
        );
        self
    }

    pub fn with_error(mut self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.responses
            .insert(url.into(), Canned::TransportError(message.into()));
        self
    }

    /// Number of `fetch` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceFetcher for FixtureFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.get(url) {
            Some(Canned::Response(r)) => Ok(r.clone()),
            Some(Canned::TransportError(msg)) => Err(anyhow!("{msg}")),
            None => Err(anyhow!("no fixture for {url}")),
        }
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
