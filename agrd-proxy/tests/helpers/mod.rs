//! Shared fakes for agrd-proxy integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agrd_proxy::services::{
    AccessToken, CatalogApi, CatalogError, Clock, CredentialBroker, CredentialError,
    IdentityProvider, SearchProxy, TokenGrant,
};
use agrd_proxy::{build_router, AppState};
use axum::Router;

/// Identity provider that hands out `token-N` and counts calls
pub struct FakeIdentity {
    pub calls: AtomicUsize,
    pub ttl_secs: u64,
    pub delay: Duration,
    failures: Mutex<Vec<CredentialError>>,
}

impl FakeIdentity {
    pub fn new(ttl_secs: u64) -> Arc<Self> {
        Self::with_delay(ttl_secs, Duration::ZERO)
    }

    pub fn with_delay(ttl_secs: u64, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            ttl_secs,
            delay,
            failures: Mutex::new(Vec::new()),
        })
    }

    /// Queue a failure for the next call
    pub fn fail_next(&self, err: CredentialError) {
        self.failures.lock().unwrap().push(err);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn request_token(&self) -> Result<TokenGrant, CredentialError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(err) = self.failures.lock().unwrap().pop() {
            return Err(err);
        }
        Ok(TokenGrant {
            access_token: format!("token-{}", n),
            expires_in: self.ttl_secs,
        })
    }
}

/// One call seen by [`FakeCatalog`]
#[derive(Debug, Clone)]
pub struct CatalogCall {
    pub token: String,
    pub document: String,
}

/// Scripted catalog answer
pub enum CatalogReply {
    Body(String),
    Unauthorized,
    Status(u16),
    Garbage,
}

/// Catalog that records calls and answers from a script (default: a fixed body)
pub struct FakeCatalog {
    pub calls: Mutex<Vec<CatalogCall>>,
    body: String,
    script: Mutex<Vec<CatalogReply>>,
}

impl FakeCatalog {
    pub fn returning(body: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            body: body.to_string(),
            script: Mutex::new(Vec::new()),
        })
    }

    /// Queue a reply for the next call
    pub fn reply_next(&self, reply: CatalogReply) {
        self.script.lock().unwrap().push(reply);
    }

    pub fn calls(&self) -> Vec<CatalogCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn query_games(
        &self,
        token: &AccessToken,
        document: &str,
    ) -> Result<String, CatalogError> {
        self.calls.lock().unwrap().push(CatalogCall {
            token: token.value.clone(),
            document: document.to_string(),
        });

        match self.script.lock().unwrap().pop() {
            None => Ok(self.body.clone()),
            Some(CatalogReply::Body(body)) => Ok(body),
            Some(CatalogReply::Unauthorized) => Err(CatalogError::Unauthorized),
            Some(CatalogReply::Status(code)) => {
                Err(CatalogError::ApiError(code, "scripted failure".into()))
            }
            Some(CatalogReply::Garbage) => {
                Err(CatalogError::ParseError("expected value at line 1".into()))
            }
        }
    }
}

/// Clock the test moves by hand
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn at(ms: i64) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(ms)))
    }

    pub fn advance(&self, ms: i64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_epoch_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Router wired to the given fakes
pub fn test_router(
    identity: Arc<FakeIdentity>,
    catalog: Arc<FakeCatalog>,
    clock: Arc<ManualClock>,
) -> Router {
    let broker = CredentialBroker::with_clock(identity, clock);
    build_router(AppState::new(SearchProxy::new(broker, catalog)))
}

pub const ZELDA_BODY: &str = r#"[{"id":1025,"name":"Zelda II: The Adventure of Link","cover":{"id":7,"image_id":"co1uii"},"first_release_date":537148800,"genres":[{"id":12,"name":"Role-playing (RPG)"}]}]"#;
