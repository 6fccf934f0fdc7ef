//! Configuration resolution for agrd-proxy
//!
//! Listen address: CLI (or its env fallback) → TOML `[proxy]` → defaults.
//! Credentials: `TWITCH_CLIENT_ID` / `TWITCH_CLIENT_SECRET` → TOML `[proxy]`.
//! Missing credentials stop startup; the proxy is useless without them.

use agrd_common::config::{resolve_env_or_toml, TomlConfig, CLIENT_ID_ENV, CLIENT_SECRET_ENV};
use agrd_common::{Error, Result};
use std::fmt;

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Resolved proxy configuration
#[derive(Clone)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub token_url: String,
    pub catalog_url: String,
    pub client_id: String,
    pub client_secret: String,
}

impl ProxyConfig {
    pub fn resolve(toml_config: &TomlConfig, overrides: ConfigOverrides) -> Result<Self> {
        let section = &toml_config.proxy;

        let client_id = resolve_env_or_toml(
            CLIENT_ID_ENV,
            section.client_id.as_deref(),
            "Catalog client ID",
        );
        let client_secret = resolve_env_or_toml(
            CLIENT_SECRET_ENV,
            section.client_secret.as_deref(),
            "Catalog client secret",
        );

        let (client_id, client_secret) = match (client_id, client_secret) {
            (Some(id), Some(secret)) => (id, secret),
            (id, secret) => {
                let mut missing = Vec::new();
                if id.is_none() {
                    missing.push(CLIENT_ID_ENV);
                }
                if secret.is_none() {
                    missing.push(CLIENT_SECRET_ENV);
                }
                return Err(Error::Config(format!(
                    "Catalog credentials not configured (missing: {}). Configure using one of:\n\
                     1. Environment: {}=... {}=...\n\
                     2. TOML config: [proxy] client_id = \"...\" client_secret = \"...\"",
                    missing.join(", "),
                    CLIENT_ID_ENV,
                    CLIENT_SECRET_ENV
                )));
            }
        };

        Ok(Self {
            host: overrides.host.unwrap_or_else(|| section.host.clone()),
            port: overrides.port.unwrap_or(section.port),
            token_url: section.token_url.clone(),
            catalog_url: section.catalog_url.clone(),
            client_id,
            client_secret,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Keeps the client secret out of logs
impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("token_url", &self.token_url)
            .field("catalog_url", &self.catalog_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}
