//! Integration tests for the authentication gate.
//!
//! Every protected endpoint must reject missing/invalid tokens before any
//! business logic runs -- no persistence or inference side effects.

mod common;

use axum::http::StatusCode;
use common::{assert_error, get_noauth, get_with_token, post_json_noauth, post_json_with_token};
use serde_json::json;

// ---------------------------------------------------------------------------
// Test: missing token is 401 with no side effects
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_token_returns_401_without_side_effects() {
    let ctx = common::build_test_context();

    let response = post_json_noauth(
        ctx.app.clone(),
        "/api/v1/characters/pair",
        json!({ "charA": common::data_url(1), "charB": common::data_url(2) }),
    )
    .await;
    assert_error(response, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;

    let listing = get_noauth(ctx.app, "/api/v1/characters").await;
    assert_eq!(listing.status(), StatusCode::UNAUTHORIZED);

    assert!(ctx.store.is_empty().await, "no documents may be written");
    assert!(ctx.blobs.is_empty().await, "no blobs may be written");
    assert_eq!(ctx.inference.describe_calls(), 0, "no inference may run");
}

// ---------------------------------------------------------------------------
// Test: malformed Authorization header is 401
// ---------------------------------------------------------------------------

#[tokio::test]
async fn non_bearer_authorization_returns_401() {
    let ctx = common::build_test_context();

    let request = axum::http::Request::builder()
        .method(axum::http::Method::GET)
        .uri("/api/v1/characters")
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(ctx.app, request).await.unwrap();

    assert_error(response, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;
}

// ---------------------------------------------------------------------------
// Test: invalid token is 403 with no side effects
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_token_returns_403_without_side_effects() {
    let ctx = common::build_test_context();

    let response = post_json_with_token(
        ctx.app.clone(),
        "/api/v1/characters/pair",
        json!({ "charA": common::data_url(1), "charB": common::data_url(2) }),
        Some("forged-token"),
    )
    .await;
    assert_error(response, StatusCode::FORBIDDEN, "FORBIDDEN").await;

    let listing = get_with_token(ctx.app, "/api/v1/characters", Some("forged-token")).await;
    assert_eq!(listing.status(), StatusCode::FORBIDDEN);

    assert!(ctx.store.is_empty().await);
    assert!(ctx.blobs.is_empty().await);
    assert_eq!(ctx.inference.describe_calls(), 0);
}

// ---------------------------------------------------------------------------
// Test: every protected route rejects anonymous requests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn all_protected_routes_require_a_token() {
    let ctx = common::build_test_context();

    let posts = [
        "/api/v1/characters/pair",
        "/api/v1/characters/training",
        "/api/v1/characters/training/some-id/complete",
        "/api/v1/characters/some-id/visualizations",
        "/api/v1/characters/some-id/visualizations/generate",
    ];
    for uri in posts {
        let response = post_json_noauth(ctx.app.clone(), uri, json!({})).await;
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "POST {uri} must require auth"
        );
    }

    for uri in ["/api/v1/characters", "/api/v1/characters/some-id"] {
        let response = get_noauth(ctx.app.clone(), uri).await;
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "GET {uri} must require auth"
        );
    }
}

// ---------------------------------------------------------------------------
// Test: a valid token reaches the handler
// ---------------------------------------------------------------------------

#[tokio::test]
async fn valid_token_is_accepted() {
    let ctx = common::build_test_context();
    let response = common::get(ctx.app, "/api/v1/characters").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = common::body_json(response).await;
    assert_eq!(json, serde_json::json!([]));
}
