//! IGDB catalog API client
//!
//! Sends a query document to `{catalog_url}/games` with the bearer token and
//! client id headers. The body comes back as raw text; it is only checked to
//! be well-formed JSON, never reshaped.

use async_trait::async_trait;
use serde::de::IgnoredAny;
use std::time::Duration;
use thiserror::Error;

use super::credential_broker::AccessToken;
use super::USER_AGENT;

/// Catalog client errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Token rejected by the catalog (HTTP 401)
    #[error("Access token rejected by catalog")]
    Unauthorized,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<CatalogError> for agrd_common::Error {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::ParseError(msg) => agrd_common::Error::MalformedResponse(msg),
            other => agrd_common::Error::UpstreamUnavailable(other.to_string()),
        }
    }
}

/// Catalog search endpoint
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Run `document` against the games endpoint and return the JSON body verbatim
    async fn query_games(&self, token: &AccessToken, document: &str)
        -> Result<String, CatalogError>;
}

/// [`CatalogApi`] for the IGDB v4 API
pub struct IgdbCatalogClient {
    http_client: reqwest::Client,
    games_url: String,
    client_id: String,
}

impl IgdbCatalogClient {
    pub fn new(catalog_url: &str, client_id: impl Into<String>) -> Result<Self, CatalogError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            games_url: format!("{}/games", catalog_url.trim_end_matches('/')),
            client_id: client_id.into(),
        })
    }

    pub fn games_url(&self) -> &str {
        &self.games_url
    }
}

#[async_trait]
impl CatalogApi for IgdbCatalogClient {
    async fn query_games(
        &self,
        token: &AccessToken,
        document: &str,
    ) -> Result<String, CatalogError> {
        tracing::debug!(url = %self.games_url, "Querying catalog");

        let response = self
            .http_client
            .post(&self.games_url)
            .header("Client-ID", &self.client_id)
            .bearer_auth(&token.value)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(document.to_string())
            .send()
            .await
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(CatalogError::Unauthorized);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CatalogError::ApiError(status.as_u16(), error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        ensure_json(&body)?;
        Ok(body)
    }
}

/// Check that `body` parses as JSON without building a value tree
pub fn ensure_json(body: &str) -> Result<(), CatalogError> {
    serde_json::from_str::<IgnoredAny>(body)
        .map(|_| ())
        .map_err(|e| CatalogError::ParseError(e.to_string()))
}
