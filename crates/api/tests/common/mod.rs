//! Shared test harness: in-memory services behind the production router.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use http_body_util::BodyExt;
use tower::ServiceExt;

use studio_api::auth::verifier::StaticVerifier;
use studio_api::background::training::TrainingScheduler;
use studio_api::config::{BlobBackend, ServerConfig, StoreBackend};
use studio_api::router::build_app_router;
use studio_api::state::AppState;
use studio_blobs::{BlobStore, MemoryBlobStore};
use studio_core::character::{Character, CharacterStatus};
use studio_inference::ScriptedClient;
use studio_store::{CharacterStore, MemoryStore};

/// Identity every valid test token resolves to.
pub const TEST_UID: &str = "test-user";
/// The only token the test verifier accepts.
pub const TEST_TOKEN: &str = "valid-test-token";
/// Simulated training duration configured for tests.
pub const TRAINING_DELAY_SECS: u64 = 120;

pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub inference: Arc<ScriptedClient>,
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        app_env: "test".to_string(),
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        project_id: "demo-project".to_string(),
        collection: "characters".to_string(),
        bucket: "demo-project.appspot.com".to_string(),
        store_backend: StoreBackend::Memory,
        blob_backend: BlobBackend::Memory,
        auth_bypass: false,
        auth_bypass_uid: TEST_UID.to_string(),
        training_delay_secs: TRAINING_DELAY_SECS,
        upload_url_ttl_secs: 900,
    }
}

/// Build the full application router over in-memory services.
///
/// This mirrors the state construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses.
pub fn build_test_context() -> TestContext {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let blobs = Arc::new(MemoryBlobStore::new());
    let inference = Arc::new(ScriptedClient::new());
    let trainer = Arc::new(TrainingScheduler::new(
        store.clone(),
        Duration::from_secs(config.training_delay_secs),
        config.project_id.clone(),
    ));

    let state = AppState {
        config: Arc::new(config.clone()),
        store: store.clone(),
        blobs: blobs.clone(),
        inference: inference.clone(),
        verifier: Arc::new(StaticVerifier::expecting(TEST_UID, TEST_TOKEN)),
        trainer,
    };

    TestContext {
        app: build_app_router(state, &config),
        store,
        blobs,
        inference,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    get_with_token(app, uri, Some(TEST_TOKEN)).await
}

pub async fn get_noauth(app: Router, uri: &str) -> Response<Body> {
    get_with_token(app, uri, None).await
}

pub async fn get_with_token(app: Router, uri: &str, token: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = builder.body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_json_with_token(app, uri, body, Some(TEST_TOKEN)).await
}

pub async fn post_json_noauth(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_json_with_token(app, uri, body, None).await
}

pub async fn post_json_with_token(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        panic!(
            "Response body was not JSON ({e}): {}",
            String::from_utf8_lossy(&bytes)
        )
    })
}

/// Assert an error body shape and return nothing; keeps tests terse.
pub async fn assert_error(response: Response<Body>, status: StatusCode, code: &str) {
    assert_eq!(response.status(), status);
    let json = body_json(response).await;
    assert_eq!(json["code"], code, "unexpected error code: {json}");
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A distinct single-byte "image" as a base64 data URL.
pub fn data_url(seed: u8) -> String {
    let bytes = vec![seed; 16];
    format!("data:image/png;base64,{}", BASE64.encode(bytes))
}

/// A ready character owned by `uid`, with one stored reference image.
pub fn ready_character(id: &str, uid: &str) -> Character {
    Character {
        id: id.to_string(),
        user_id: uid.to_string(),
        name: format!("Character {id}"),
        description: "A seeded test character".to_string(),
        keywords: vec!["seeded".to_string()],
        image_urls: vec![format!("memory://studio/references/{uid}/{id}/reference.jpg")],
        image_paths: vec![format!("references/{uid}/{id}/reference.jpg")],
        status: CharacterStatus::Ready,
        model_endpoint: None,
        created_at: Utc::now(),
        visualizations: Vec::new(),
    }
}

/// Seed a character record and its reference blob.
pub async fn seed_character(ctx: &TestContext, id: &str, uid: &str) -> Character {
    let character = ready_character(id, uid);
    ctx.blobs
        .put(&character.image_paths[0], &[7u8; 32], "image/jpeg")
        .await
        .unwrap();
    ctx.store.insert(&character).await.unwrap();
    character
}
