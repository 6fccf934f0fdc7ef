//! Search backend: the dispatcher's only way to reach the catalog
//!
//! Production traffic goes to agrd-proxy's `POST /search`. Decoding is typed:
//! an array of games is a result (possibly empty), the proxy's error envelope
//! is an upstream failure, anything else is a malformed response.

use agrd_common::{Error, GameSummary, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Something that answers a free-text game search
#[async_trait]
pub trait SearchBackend: Send + Sync + 'static {
    async fn search(&self, query: &str) -> Result<Vec<GameSummary>>;
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// [`SearchBackend`] over HTTP to agrd-proxy
pub struct HttpSearchBackend {
    http_client: reqwest::Client,
    search_url: String,
}

impl HttpSearchBackend {
    pub fn new(server_url: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("agrd-client/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Config(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            http_client,
            search_url: format!("{}/search", server_url.trim_end_matches('/')),
        })
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn search(&self, query: &str) -> Result<Vec<GameSummary>> {
        debug!(url = %self.search_url, "Sending search");

        let response = self
            .http_client
            .post(&self.search_url)
            .json(&SearchRequest { query })
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::UpstreamUnavailable(e.to_string()))?;

        decode_search_response(status.as_u16(), &body)
    }
}

/// Turn a `/search` answer into games or a typed error
///
/// A non-success status whose body is not the error envelope still counts as
/// an upstream failure (a gateway page, for instance).
pub fn decode_search_response(status: u16, body: &str) -> Result<Vec<GameSummary>> {
    let array_err = match serde_json::from_str::<Vec<GameSummary>>(body) {
        Ok(games) if (200..300).contains(&status) => return Ok(games),
        Ok(_) => return Err(Error::UpstreamUnavailable(format!("HTTP {}", status))),
        Err(e) => e,
    };

    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        return Err(Error::UpstreamUnavailable(format!(
            "{}: {}",
            envelope.error.code, envelope.error.message
        )));
    }

    if !(200..300).contains(&status) {
        return Err(Error::UpstreamUnavailable(format!("HTTP {}", status)));
    }

    Err(Error::MalformedResponse(array_err.to_string()))
}
