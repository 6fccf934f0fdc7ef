//! Credential broker for the catalog API
//!
//! Owns the single process-wide access token. Callers ask for a valid token
//! with [`CredentialBroker::get_valid_token`]; the broker refreshes it from the
//! identity provider when it is absent or expired.
//!
//! **Single-flight refresh:** at most one refresh is in flight. Callers that
//! find the token stale while a refresh is running await that same refresh and
//! receive the same token or the same error. Reads of a fresh token only take
//! the shared side of a read/write lock.
//!
//! A failed refresh caches nothing and leaves the previous token in place; the
//! next call asks the identity provider again.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Identity provider errors
///
/// `Clone` because one refresh result is handed to every waiting caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Identity provider rejected credentials ({0}): {1}")]
    Rejected(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    /// Refresh task panicked or was cancelled by runtime shutdown
    #[error("Token refresh task failed: {0}")]
    RefreshTask(String),
}

impl From<CredentialError> for agrd_common::Error {
    fn from(err: CredentialError) -> Self {
        agrd_common::Error::CredentialUnavailable(err.to_string())
    }
}

/// Token endpoint response body
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Time to live in seconds
    pub expires_in: u64,
}

/// Bearer token with its local expiry bookkeeping
///
/// The provider stays the source of truth: a token that looks fresh here may
/// still be rejected upstream (see [`CredentialBroker::invalidate`]).
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at_epoch_ms: i64,
}

impl AccessToken {
    pub fn from_grant(grant: TokenGrant, now_epoch_ms: i64) -> Self {
        let ttl_ms = i64::try_from(grant.expires_in)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);
        Self {
            value: grant.access_token,
            expires_at_epoch_ms: now_epoch_ms.saturating_add(ttl_ms),
        }
    }

    pub fn is_expired_at(&self, now_epoch_ms: i64) -> bool {
        now_epoch_ms >= self.expires_at_epoch_ms
    }
}

// Keeps the bearer value out of logs
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at_epoch_ms", &self.expires_at_epoch_ms)
            .finish()
    }
}

/// Source of new access tokens
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn request_token(&self) -> Result<TokenGrant, CredentialError>;
}

/// Wall clock in Unix epoch milliseconds
pub trait Clock: Send + Sync {
    fn now_epoch_ms(&self) -> i64;
}

/// [`Clock`] backed by the system time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

type RefreshFlight = Shared<BoxFuture<'static, Result<AccessToken, CredentialError>>>;

struct BrokerInner {
    provider: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
    cached: RwLock<Option<AccessToken>>,
    in_flight: Mutex<Option<RefreshFlight>>,
}

/// Process-wide access token cache with single-flight refresh
///
/// Cheap to clone; clones share the same cache.
#[derive(Clone)]
pub struct CredentialBroker {
    inner: Arc<BrokerInner>,
}

impl CredentialBroker {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self::with_clock(provider, Arc::new(SystemClock))
    }

    pub fn with_clock(provider: Arc<dyn IdentityProvider>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                provider,
                clock,
                cached: RwLock::new(None),
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Return the cached token, refreshing it first when absent or expired
    pub async fn get_valid_token(&self) -> Result<AccessToken, CredentialError> {
        if let Some(token) = self.fresh_cached().await {
            return Ok(token);
        }

        let flight = {
            let mut in_flight = self.inner.in_flight.lock().await;

            // A refresh may have landed between the read above and taking the guard
            if let Some(token) = self.fresh_cached().await {
                return Ok(token);
            }

            match in_flight.as_ref() {
                Some(flight) => {
                    debug!("Joining in-flight token refresh");
                    flight.clone()
                }
                None => {
                    let flight = self.start_refresh();
                    *in_flight = Some(flight.clone());
                    flight
                }
            }
        };

        flight.await
    }

    /// Drop `token` from the cache if it is still the cached one
    ///
    /// Called when the catalog rejects the token, so the next request refreshes.
    pub async fn invalidate(&self, token: &AccessToken) {
        let mut cached = self.inner.cached.write().await;
        if cached.as_ref().is_some_and(|c| c.value == token.value) {
            *cached = None;
            info!("Cached access token invalidated after upstream rejection");
        }
    }

    /// True when a non-expired token is cached
    pub async fn has_fresh_token(&self) -> bool {
        self.fresh_cached().await.is_some()
    }

    async fn fresh_cached(&self) -> Option<AccessToken> {
        let now = self.inner.clock.now_epoch_ms();
        self.inner
            .cached
            .read()
            .await
            .as_ref()
            .filter(|token| !token.is_expired_at(now))
            .cloned()
    }

    /// Start a refresh task and return the shared handle to its outcome
    ///
    /// The request runs in its own task, so it completes even when every
    /// caller awaiting it is dropped. The task stores the new token (expiry
    /// measured when the grant arrives) and clears the in-flight slot itself.
    fn start_refresh(&self) -> RefreshFlight {
        let inner = Arc::clone(&self.inner);

        let task = tokio::spawn(async move {
            debug!("Requesting access token from identity provider");

            let outcome = match inner.provider.request_token().await {
                Ok(grant) => {
                    let token = AccessToken::from_grant(grant, inner.clock.now_epoch_ms());
                    *inner.cached.write().await = Some(token.clone());
                    info!(
                        expires_at_epoch_ms = token.expires_at_epoch_ms,
                        "Access token refreshed"
                    );
                    Ok(token)
                }
                Err(e) => {
                    warn!(error = %e, "Access token refresh failed");
                    Err(e)
                }
            };

            inner.in_flight.lock().await.take();
            outcome
        });

        async move {
            task.await
                .unwrap_or_else(|e| Err(CredentialError::RefreshTask(e.to_string())))
        }
        .boxed()
        .shared()
    }
}
