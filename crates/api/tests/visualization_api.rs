//! Integration tests for visualization generation and saving.

mod common;

use axum::http::StatusCode;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use common::{assert_error, body_json, post_json, TEST_UID};
use serde_json::json;
use studio_blobs::BlobStore;
use studio_core::images::ImageData;
use studio_store::CharacterStore;

fn generated_pixel() -> ImageData {
    ImageData {
        mime_type: "image/png".to_string(),
        bytes: vec![9, 9, 9, 9],
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Generation returns the model's image without persisting anything.
#[tokio::test]
async fn generate_returns_image_without_persisting() {
    let ctx = common::build_test_context();
    common::seed_character(&ctx, "mine", TEST_UID).await;
    ctx.inference.enqueue_image(generated_pixel());

    let response = post_json(
        ctx.app,
        "/api/v1/characters/mine/visualizations/generate",
        json!({ "prompt": "standing in a thunderstorm" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["imageBase64"], BASE64.encode([9u8, 9, 9, 9]));
    assert_eq!(json["mimeType"], "image/png");

    // Nothing persisted: still just the seeded reference blob, no entries.
    assert_eq!(ctx.blobs.len().await, 1);
    let record = ctx.store.get("mine").await.unwrap().unwrap();
    assert!(record.visualizations.is_empty());
    assert_eq!(ctx.inference.render_calls(), 1);
}

/// Trained characters route generation through their model endpoint.
#[tokio::test]
async fn generate_passes_the_trained_model_endpoint() {
    let ctx = common::build_test_context();
    let mut character = common::ready_character("trained", TEST_UID);
    character.model_endpoint = Some("projects/demo-project/models/m-1".to_string());
    ctx.store.insert(&character).await.unwrap();
    ctx.blobs
        .put(&character.image_paths[0], &[7u8; 16], "image/jpeg")
        .await
        .unwrap();
    ctx.inference.enqueue_image(generated_pixel());

    let response = post_json(
        ctx.app,
        "/api/v1/characters/trained/visualizations/generate",
        json!({ "prompt": "portrait" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(
        ctx.inference.last_model_override().as_deref(),
        Some("projects/demo-project/models/m-1")
    );
}

#[tokio::test]
async fn generate_with_empty_prompt_is_400_without_inference() {
    let ctx = common::build_test_context();
    common::seed_character(&ctx, "mine", TEST_UID).await;

    let response = post_json(
        ctx.app,
        "/api/v1/characters/mine/visualizations/generate",
        json!({ "prompt": "" }),
    )
    .await;
    assert_error(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;
    assert_eq!(ctx.inference.render_calls(), 0);
}

#[tokio::test]
async fn generate_unknown_character_is_404() {
    let ctx = common::build_test_context();
    let response = post_json(
        ctx.app,
        "/api/v1/characters/ghost/visualizations/generate",
        json!({ "prompt": "anything" }),
    )
    .await;
    assert_error(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;
}

#[tokio::test]
async fn generate_foreign_character_is_403() {
    let ctx = common::build_test_context();
    common::seed_character(&ctx, "theirs", "someone-else").await;

    let response = post_json(
        ctx.app,
        "/api/v1/characters/theirs/visualizations/generate",
        json!({ "prompt": "anything" }),
    )
    .await;
    assert_error(response, StatusCode::FORBIDDEN, "FORBIDDEN").await;
    assert_eq!(ctx.inference.render_calls(), 0);
}

/// A model that produces no image payload surfaces as a sanitized 500.
#[tokio::test]
async fn generate_upstream_failure_is_500() {
    let ctx = common::build_test_context();
    common::seed_character(&ctx, "mine", TEST_UID).await;
    ctx.inference.enqueue_image_error("no image produced");

    let response = post_json(
        ctx.app,
        "/api/v1/characters/mine/visualizations/generate",
        json!({ "prompt": "portrait" }),
    )
    .await;
    assert_error(response, StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR").await;
}

// ---------------------------------------------------------------------------
// Saving
// ---------------------------------------------------------------------------

/// Saving twice yields two entries, order preserved by creation time.
#[tokio::test]
async fn save_is_append_only_and_preserves_order() {
    let ctx = common::build_test_context();
    common::seed_character(&ctx, "mine", TEST_UID).await;

    for prompt in ["first prompt", "second prompt"] {
        let response = post_json(
            ctx.app.clone(),
            "/api/v1/characters/mine/visualizations",
            json!({
                "prompt": prompt,
                "imageBase64": BASE64.encode([5u8, 6, 7]),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let json = body_json(response).await;
        assert_eq!(json["prompt"], prompt);
        assert!(json["imageUrl"].as_str().unwrap().contains("visualizations/"));
    }

    let record = ctx.store.get("mine").await.unwrap().unwrap();
    let prompts: Vec<&str> = record
        .visualizations
        .iter()
        .map(|v| v.prompt.as_str())
        .collect();
    assert_eq!(prompts, vec!["first prompt", "second prompt"]);

    // Entries keep distinct ids and blobs: the reference plus two saved images.
    assert_ne!(record.visualizations[0].id, record.visualizations[1].id);
    assert_eq!(ctx.blobs.len().await, 3);
}

#[tokio::test]
async fn save_with_invalid_base64_is_400() {
    let ctx = common::build_test_context();
    common::seed_character(&ctx, "mine", TEST_UID).await;

    let response = post_json(
        ctx.app,
        "/api/v1/characters/mine/visualizations",
        json!({ "prompt": "p", "imageBase64": "!!!not-base64!!!" }),
    )
    .await;
    assert_error(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;

    let record = ctx.store.get("mine").await.unwrap().unwrap();
    assert!(record.visualizations.is_empty());
}

#[tokio::test]
async fn save_foreign_character_is_403_without_side_effects() {
    let ctx = common::build_test_context();
    common::seed_character(&ctx, "theirs", "someone-else").await;

    let response = post_json(
        ctx.app,
        "/api/v1/characters/theirs/visualizations",
        json!({ "prompt": "p", "imageBase64": BASE64.encode([1u8]) }),
    )
    .await;
    assert_error(response, StatusCode::FORBIDDEN, "FORBIDDEN").await;

    let record = ctx.store.get("theirs").await.unwrap().unwrap();
    assert!(record.visualizations.is_empty());
}
