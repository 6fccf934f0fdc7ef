//! Search proxy: free-text query in, raw catalog JSON out
//!
//! Stateless apart from the shared [`CredentialBroker`]. No retries: a failed
//! token refresh or catalog call is reported and the user repeats the action.

use agrd_common::Result;
use std::sync::Arc;
use tracing::{debug, warn};

use super::catalog_client::{CatalogApi, CatalogError};
use super::credential_broker::CredentialBroker;
use super::query_document::build_search_document;

/// Body returned for a blank query
pub const EMPTY_RESULT: &str = "[]";

/// Translates search requests into authenticated catalog queries
#[derive(Clone)]
pub struct SearchProxy {
    broker: CredentialBroker,
    catalog: Arc<dyn CatalogApi>,
}

impl SearchProxy {
    pub fn new(broker: CredentialBroker, catalog: Arc<dyn CatalogApi>) -> Self {
        Self { broker, catalog }
    }

    pub fn broker(&self) -> &CredentialBroker {
        &self.broker
    }

    /// Search the catalog and return its JSON body unmodified
    ///
    /// A blank query returns an empty JSON array without asking for a token or
    /// touching the network.
    pub async fn search(&self, query: &str) -> Result<String> {
        if query.trim().is_empty() {
            debug!("Blank query answered locally");
            return Ok(EMPTY_RESULT.to_string());
        }

        let token = self.broker.get_valid_token().await?;
        let document = build_search_document(query)?;

        match self.catalog.query_games(&token, &document).await {
            Ok(body) => Ok(body),
            Err(CatalogError::Unauthorized) => {
                warn!("Catalog rejected the cached access token");
                self.broker.invalidate(&token).await;
                Err(CatalogError::Unauthorized.into())
            }
            Err(e) => {
                warn!(error = %e, "Catalog query failed");
                Err(e.into())
            }
        }
    }
}
