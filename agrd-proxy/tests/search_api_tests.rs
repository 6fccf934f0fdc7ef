//! HTTP tests for `POST /search` and `GET /health`
//!
//! The router runs against in-process fakes for the identity provider and the
//! catalog, driven through `tower::ServiceExt::oneshot`.

mod helpers;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use agrd_proxy::services::CredentialError;
use helpers::{test_router, CatalogReply, FakeCatalog, FakeIdentity, ManualClock, ZELDA_BODY};

async fn post_search(app: &Router, body: Value) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/search")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn error_code(body: &str) -> String {
    let value: Value = serde_json::from_str(body).unwrap();
    value["error"]["code"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_search_returns_upstream_body_verbatim() {
    let identity = FakeIdentity::new(3600);
    let catalog = FakeCatalog::returning(ZELDA_BODY);
    let app = test_router(identity.clone(), catalog.clone(), ManualClock::at(0));

    let (status, body) = post_search(&app, json!({ "query": "Zelda" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ZELDA_BODY, "body must not be reshaped");

    let calls = catalog.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].token, "token-1");
    assert_eq!(
        calls[0].document,
        "search \"Zelda\"; fields name,cover.image_id,first_release_date,genres.name; limit 10;"
    );
}

#[tokio::test]
async fn test_second_search_reuses_cached_token() {
    let identity = FakeIdentity::new(3600);
    let catalog = FakeCatalog::returning("[]");
    let clock = ManualClock::at(1_700_000_000_000);
    let app = test_router(identity.clone(), catalog.clone(), clock.clone());

    let (status, _) = post_search(&app, json!({ "query": "Zelda" })).await;
    assert_eq!(status, StatusCode::OK);

    clock.advance(10_000);
    let (status, _) = post_search(&app, json!({ "query": "Metroid" })).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(identity.calls(), 1, "token should be reused within its TTL");
    let calls = catalog.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.token == "token-1"));
    assert!(calls.iter().all(|c| c.document.ends_with("limit 10;")));
    assert!(calls[1].document.starts_with("search \"Metroid\";"));
}

#[tokio::test]
async fn test_token_refreshed_after_expiry() {
    let identity = FakeIdentity::new(3600);
    let catalog = FakeCatalog::returning("[]");
    let clock = ManualClock::at(0);
    let app = test_router(identity.clone(), catalog.clone(), clock.clone());

    post_search(&app, json!({ "query": "Zelda" })).await;
    clock.advance(3_600_000);
    post_search(&app, json!({ "query": "Zelda" })).await;

    assert_eq!(identity.calls(), 2);
    assert_eq!(catalog.calls()[1].token, "token-2");
}

#[tokio::test]
async fn test_blank_query_short_circuits() {
    let identity = FakeIdentity::new(3600);
    let catalog = FakeCatalog::returning(ZELDA_BODY);
    let app = test_router(identity.clone(), catalog.clone(), ManualClock::at(0));

    for query in ["", "   ", "\t\n"] {
        let (status, body) = post_search(&app, json!({ "query": query })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "[]");
    }

    assert_eq!(identity.calls(), 0, "blank queries must not request a token");
    assert!(catalog.calls().is_empty(), "blank queries must not reach the catalog");
}

#[tokio::test]
async fn test_identity_failure_returns_error_then_retries() {
    let identity = FakeIdentity::new(3600);
    identity.fail_next(CredentialError::Rejected(403, "invalid client secret".into()));
    let catalog = FakeCatalog::returning(ZELDA_BODY);
    let app = test_router(identity.clone(), catalog.clone(), ManualClock::at(0));

    let (status, body) = post_search(&app, json!({ "query": "Zelda" })).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(error_code(&body), "UPSTREAM_UNAVAILABLE");
    assert!(catalog.calls().is_empty());

    // Nothing was cached, so the next call goes back to the provider
    let (status, body) = post_search(&app, json!({ "query": "Zelda" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ZELDA_BODY);
    assert_eq!(identity.calls(), 2);
}

#[tokio::test]
async fn test_catalog_failure_maps_to_bad_gateway() {
    let identity = FakeIdentity::new(3600);
    let catalog = FakeCatalog::returning("[]");
    catalog.reply_next(CatalogReply::Status(500));
    let app = test_router(identity.clone(), catalog.clone(), ManualClock::at(0));

    let (status, body) = post_search(&app, json!({ "query": "Zelda" })).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(error_code(&body), "UPSTREAM_UNAVAILABLE");
}

#[tokio::test]
async fn test_malformed_catalog_body() {
    let identity = FakeIdentity::new(3600);
    let catalog = FakeCatalog::returning("[]");
    catalog.reply_next(CatalogReply::Garbage);
    let app = test_router(identity.clone(), catalog.clone(), ManualClock::at(0));

    let (status, body) = post_search(&app, json!({ "query": "Zelda" })).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(error_code(&body), "MALFORMED_RESPONSE");
}

#[tokio::test]
async fn test_unauthorized_catalog_drops_cached_token() {
    let identity = FakeIdentity::new(3600);
    let catalog = FakeCatalog::returning("[]");
    catalog.reply_next(CatalogReply::Unauthorized);
    let app = test_router(identity.clone(), catalog.clone(), ManualClock::at(0));

    let (status, _) = post_search(&app, json!({ "query": "Zelda" })).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(identity.calls(), 1);

    // No automatic retry, but the next user action gets a fresh token
    let (status, _) = post_search(&app, json!({ "query": "Zelda" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(identity.calls(), 2);
    assert_eq!(catalog.calls()[1].token, "token-2");
}

#[tokio::test]
async fn test_missing_query_field_is_bad_request() {
    let identity = FakeIdentity::new(3600);
    let catalog = FakeCatalog::returning("[]");
    let app = test_router(identity.clone(), catalog.clone(), ManualClock::at(0));

    let (status, body) = post_search(&app, json!({ "q": "Zelda" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "BAD_REQUEST");
    assert_eq!(identity.calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_searches_share_one_token_refresh() {
    let identity = FakeIdentity::with_delay(3600, std::time::Duration::from_millis(100));
    let catalog = FakeCatalog::returning("[]");
    let app = test_router(identity.clone(), catalog.clone(), ManualClock::at(0));

    let mut join_set = tokio::task::JoinSet::new();
    for i in 0..12 {
        let app = app.clone();
        join_set.spawn(async move { post_search(&app, json!({ "query": format!("game {}", i) })).await });
    }

    while let Some(result) = join_set.join_next().await {
        let (status, _) = result.expect("Task panicked");
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(identity.calls(), 1);
    let calls = catalog.calls();
    assert_eq!(calls.len(), 12);
    assert!(calls.iter().all(|c| c.token == "token-1"));
}

#[tokio::test]
async fn test_health_reports_token_state() {
    let identity = FakeIdentity::new(3600);
    let catalog = FakeCatalog::returning("[]");
    let app = test_router(identity.clone(), catalog.clone(), ManualClock::at(0));

    let health = |app: Router| async move {
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice::<Value>(&bytes).unwrap()
    };

    let before = health(app.clone()).await;
    assert_eq!(before["module"], "agrd-proxy");
    assert_eq!(before["token_cached"], false);
    assert!(before.get("last_error").is_none());

    post_search(&app, json!({ "query": "Zelda" })).await;

    let after = health(app.clone()).await;
    assert_eq!(after["token_cached"], true);
}
