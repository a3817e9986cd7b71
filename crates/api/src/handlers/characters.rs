//! Handlers for the character library and paired creation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use studio_blobs::keys;
use studio_core::character::{Character, CharacterStatus};
use studio_core::error::CoreError;
use studio_core::images::{parse_data_url, ImageData};
use studio_core::saga::Saga;
use studio_core::types::{new_character_id, CharacterId};
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::handlers::{owned_character, unwind};
use crate::state::AppState;

/// GET /api/v1/characters
///
/// All characters owned by the caller, newest first.
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<Character>>> {
    let characters = state.store.list_for_user(&user.uid).await?;
    Ok(Json(characters))
}

/// GET /api/v1/characters/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<CharacterId>,
) -> AppResult<Json<Character>> {
    let character = owned_character(&state, &user.uid, &id).await?;
    Ok(Json(character))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePairRequest {
    /// First reference image as a base64 data URL.
    #[serde(default)]
    #[validate(length(min = 1, message = "charA is required"))]
    pub char_a: String,
    /// Second reference image as a base64 data URL.
    #[serde(default)]
    #[validate(length(min = 1, message = "charB is required"))]
    pub char_b: String,
}

/// POST /api/v1/characters/pair
///
/// Creates two independent characters, one per image. Each image goes
/// through analyze -> blob write -> document write; committed side effects
/// are recorded in a [`Saga`] so a failure partway (typically the second
/// image's inference call) unwinds the first character's document and blob
/// before the 500 is returned.
pub async fn create_pair(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreatePairRequest>,
) -> AppResult<(StatusCode, Json<Vec<Character>>)> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    // Decode both payloads up front so malformed input is rejected before
    // any inference or storage side effect.
    let image_a = parse_data_url(&input.char_a)?;
    let image_b = parse_data_url(&input.char_b)?;

    let mut saga = Saga::new();

    let first = match analyze_and_store(&state, &user.uid, image_a, &mut saga).await {
        Ok(character) => character,
        Err(e) => {
            unwind(saga, "create_pair").await;
            return Err(e);
        }
    };

    let second = match analyze_and_store(&state, &user.uid, image_b, &mut saga).await {
        Ok(character) => character,
        Err(e) => {
            tracing::warn!(
                first_id = %first.id,
                "Second character failed; removing the first"
            );
            unwind(saga, "create_pair").await;
            return Err(e);
        }
    };

    saga.commit();
    Ok((StatusCode::CREATED, Json(vec![first, second])))
}

/// Analyze one image and persist the resulting character.
///
/// Records an undo step after each committed side effect, in order, so
/// compensation replays document-then-blob deletion.
async fn analyze_and_store(
    state: &AppState,
    uid: &str,
    image: ImageData,
    saga: &mut Saga,
) -> AppResult<Character> {
    let profile = state.inference.describe_character(&image).await?;

    let id = new_character_id();
    let path = keys::reference_image(uid, &id, image.extension());
    let url = state.blobs.put(&path, &image.bytes, &image.mime_type).await?;
    {
        let blobs = state.blobs.clone();
        let path = path.clone();
        saga.record("delete-reference-blob", move || async move {
            blobs.delete(&path).await.map_err(|e| e.to_string())
        });
    }

    let character = Character {
        id: id.clone(),
        user_id: uid.to_string(),
        name: profile.name,
        description: profile.description,
        keywords: profile.keywords,
        image_urls: vec![url],
        image_paths: vec![path],
        status: CharacterStatus::Ready,
        model_endpoint: None,
        created_at: Utc::now(),
        visualizations: Vec::new(),
    };
    state.store.insert(&character).await?;
    {
        let store = state.store.clone();
        let id = id.clone();
        saga.record("delete-character-document", move || async move {
            store.delete(&id).await.map_err(|e| e.to_string())
        });
    }

    tracing::info!(character_id = %character.id, name = %character.name, "Character created");
    Ok(character)
}
