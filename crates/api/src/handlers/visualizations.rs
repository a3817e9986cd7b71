//! Handlers for visualization generation and saving.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use studio_blobs::keys;
use studio_core::character::Visualization;
use studio_core::error::CoreError;
use studio_core::images::ImageData;
use studio_core::types::{new_visualization_id, CharacterId};
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::handlers::owned_character;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 2000, message = "prompt is required"))]
    pub prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub image_base64: String,
    pub mime_type: String,
}

/// POST /api/v1/characters/{id}/visualizations/generate
///
/// Renders the character with the given prompt and returns the image bytes
/// without persisting anything. Trained characters pass their model
/// endpoint through to the inference client.
pub async fn generate(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<CharacterId>,
    Json(input): Json<GenerateRequest>,
) -> AppResult<Json<GeneratedImage>> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    let character = owned_character(&state, &user.uid, &id).await?;
    let reference_path = character.image_paths.first().ok_or_else(|| {
        AppError::InternalError(format!("Character {id} has no reference image"))
    })?;

    let blob = state.blobs.get(reference_path).await?;
    let reference = ImageData {
        mime_type: blob.content_type,
        bytes: blob.bytes,
    };

    let generated = state
        .inference
        .render_character(&reference, &input.prompt, character.model_endpoint.as_deref())
        .await?;

    Ok(Json(GeneratedImage {
        image_base64: generated.to_base64(),
        mime_type: generated.mime_type,
    }))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 2000, message = "prompt is required"))]
    pub prompt: String,
    /// The generated image bytes as returned by the generate endpoint.
    #[serde(default)]
    #[validate(length(min = 1, message = "imageBase64 is required"))]
    pub image_base64: String,
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
}

fn default_mime_type() -> String {
    "image/png".to_string()
}

/// POST /api/v1/characters/{id}/visualizations
///
/// Persists a previously generated image: writes it to blob storage and
/// appends a visualization entry to the owning character. Entries are
/// append-only.
pub async fn save(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<CharacterId>,
    Json(input): Json<SaveRequest>,
) -> AppResult<(StatusCode, Json<Visualization>)> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    let character = owned_character(&state, &user.uid, &id).await?;

    let image = ImageData::from_base64(&input.image_base64, &input.mime_type)?;
    let visualization_id = new_visualization_id();
    let path = keys::visualization_image(
        &user.uid,
        &character.id,
        &visualization_id,
        image.extension(),
    );
    let url = state.blobs.put(&path, &image.bytes, &image.mime_type).await?;

    let visualization = Visualization {
        id: visualization_id,
        image_url: url,
        prompt: input.prompt,
        created_at: Utc::now(),
    };
    state
        .store
        .append_visualization(&character.id, &visualization)
        .await?;

    tracing::info!(
        character_id = %character.id,
        visualization_id = %visualization.id,
        "Visualization saved"
    );
    Ok((StatusCode::CREATED, Json(visualization)))
}
