//! Twitch identity provider client
//!
//! Client-credentials grant: the client id and secret go in the query string
//! of a POST to the token endpoint, the answer is `{ access_token, expires_in }`.

use async_trait::async_trait;
use std::time::Duration;

use super::credential_broker::{CredentialError, IdentityProvider, TokenGrant};
use super::USER_AGENT;

/// [`IdentityProvider`] talking to the Twitch OAuth token endpoint
pub struct TwitchIdentityProvider {
    http_client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl TwitchIdentityProvider {
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, CredentialError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CredentialError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        })
    }
}

#[async_trait]
impl IdentityProvider for TwitchIdentityProvider {
    async fn request_token(&self) -> Result<TokenGrant, CredentialError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ];

        tracing::debug!(url = %self.token_url, "Requesting client-credentials token");

        let response = self
            .http_client
            .post(&self.token_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| CredentialError::NetworkError(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CredentialError::Rejected(status.as_u16(), error_text));
        }

        let grant: TokenGrant = response
            .json()
            .await
            .map_err(|e| CredentialError::ParseError(e.to_string()))?;

        if grant.access_token.trim().is_empty() {
            return Err(CredentialError::ParseError(
                "token endpoint returned an empty access_token".to_string(),
            ));
        }

        Ok(grant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let provider = TwitchIdentityProvider::new("http://127.0.0.1:1/token", "id", "secret");
        assert!(provider.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        // Port 1 is never listening on loopback
        let provider =
            TwitchIdentityProvider::new("http://127.0.0.1:1/token", "id", "secret").unwrap();
        let result = provider.request_token().await;
        assert!(matches!(result, Err(CredentialError::NetworkError(_))));
    }
}
