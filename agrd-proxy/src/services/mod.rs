//! Upstream integrations and the search pipeline
//!
//! - `credential_broker`: cached access token with single-flight refresh
//! - `identity_client`: Twitch client-credentials token endpoint
//! - `catalog_client`: IGDB games endpoint
//! - `query_document`: escaped query document builder
//! - `search_proxy`: ties the above together for `POST /search`

pub mod catalog_client;
pub mod credential_broker;
pub mod identity_client;
pub mod query_document;
pub mod search_proxy;

pub use catalog_client::{CatalogApi, CatalogError, IgdbCatalogClient};
pub use credential_broker::{
    AccessToken, Clock, CredentialBroker, CredentialError, IdentityProvider, SystemClock,
    TokenGrant,
};
pub use identity_client::TwitchIdentityProvider;
pub use search_proxy::SearchProxy;

pub(crate) const USER_AGENT: &str = concat!("agrd-proxy/", env!("CARGO_PKG_VERSION"));
