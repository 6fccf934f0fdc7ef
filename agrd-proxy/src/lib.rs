//! agrd-proxy library interface
//!
//! Search proxy in front of the IGDB catalog. Holds the catalog credentials,
//! keeps one access token fresh for all requests, and forwards searches.

pub mod api;
pub mod config;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::services::SearchProxy;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Search pipeline (owns the credential broker)
    pub proxy: SearchProxy,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(proxy: SearchProxy) -> Self {
        Self {
            proxy,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::search_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
