//! `POST /search`
//!
//! Body `{ "query": "..." }`. Answers with the catalog's JSON array as-is.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tracing::{debug, error};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Search request body
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

/// POST /search
pub async fn search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    debug!(query = %request.query, "Search request received");

    match state.proxy.search(&request.query).await {
        Ok(body) => Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response()),
        Err(e) => {
            error!(error = %e, "Search failed");
            *state.last_error.write().await = Some(e.to_string());
            Err(e.into())
        }
    }
}

/// Build search routes
pub fn search_routes() -> Router<AppState> {
    Router::new().route("/search", post(search))
}
