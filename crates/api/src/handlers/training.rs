//! Handlers for the batch-training creation flow.
//!
//! Two entry shapes share one endpoint: declared files (two-phase upload via
//! signed URLs, finished by the `/complete` notification) and inline data
//! URLs (blobs uploaded here, training starts immediately). Either way the
//! record walks `uploading -> training -> ready`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use studio_blobs::{keys, SignedUpload};
use studio_core::character::{Character, CharacterStatus, MIN_TRAINING_IMAGES};
use studio_core::error::CoreError;
use studio_core::images::parse_data_url;
use studio_core::saga::Saga;
use studio_core::types::{new_character_id, CharacterId};
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::handlers::{owned_character, unwind};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TrainingRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 120, message = "name is required"))]
    pub name: String,
    /// Two-phase variant: declared files to upload via signed URLs.
    #[serde(default)]
    pub files: Vec<FileDeclaration>,
    /// Inline variant: base64 data URLs.
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDeclaration {
    pub name: String,
    pub content_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingResponse {
    pub character: Character,
    /// One grant per declared file; empty for the inline variant.
    pub uploads: Vec<SignedUpload>,
}

/// POST /api/v1/characters/training
pub async fn begin(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<TrainingRequest>,
) -> AppResult<(StatusCode, Json<TrainingResponse>)> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    match (input.files.is_empty(), input.images.is_empty()) {
        (true, true) => {
            return Err(AppError::Core(CoreError::Validation(
                "Provide either files or images".into(),
            )))
        }
        (false, false) => {
            return Err(AppError::Core(CoreError::Validation(
                "Provide files or images, not both".into(),
            )))
        }
        _ => {}
    }

    let count = input.files.len().max(input.images.len());
    if count < MIN_TRAINING_IMAGES {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Batch training requires at least {MIN_TRAINING_IMAGES} images, got {count}"
        ))));
    }

    if input.files.is_empty() {
        begin_inline(state, user, input).await
    } else {
        begin_two_phase(state, user, input).await
    }
}

/// Two-phase variant: create the record in `uploading` and hand back one
/// signed PUT URL per declared file. The client uploads directly to blob
/// storage and then calls `/complete`.
async fn begin_two_phase(
    state: AppState,
    user: AuthUser,
    input: TrainingRequest,
) -> AppResult<(StatusCode, Json<TrainingResponse>)> {
    let id = new_character_id();

    let mut paths = Vec::with_capacity(input.files.len());
    for file in &input.files {
        keys::validate_file_name(&file.name)?;
        let path = keys::training_image(&user.uid, &id, &file.name);
        if paths.contains(&path) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Duplicate file name '{}'",
                file.name
            ))));
        }
        paths.push(path);
    }

    let character = Character {
        id: id.clone(),
        user_id: user.uid.clone(),
        name: input.name.clone(),
        description: String::new(),
        keywords: Vec::new(),
        image_urls: paths.iter().map(|p| state.blobs.public_url(p)).collect(),
        image_paths: paths.clone(),
        status: CharacterStatus::Uploading,
        model_endpoint: None,
        created_at: Utc::now(),
        visualizations: Vec::new(),
    };
    state.store.insert(&character).await?;

    let mut saga = Saga::new();
    {
        let store = state.store.clone();
        let id = id.clone();
        saga.record("delete-character-document", move || async move {
            store.delete(&id).await.map_err(|e| e.to_string())
        });
    }

    let ttl = state.config.upload_url_ttl_secs;
    let mut uploads = Vec::with_capacity(paths.len());
    for (file, path) in input.files.iter().zip(&paths) {
        match state
            .blobs
            .signed_upload_url(path, &file.content_type, ttl)
            .await
        {
            Ok(grant) => uploads.push(grant),
            Err(e) => {
                unwind(saga, "training_begin").await;
                return Err(e.into());
            }
        }
    }

    saga.commit();
    tracing::info!(
        character_id = %id,
        files = uploads.len(),
        "Batch training started; awaiting uploads"
    );
    Ok((
        StatusCode::CREATED,
        Json(TrainingResponse { character, uploads }),
    ))
}

/// Inline variant: upload every image concurrently (all-or-nothing join),
/// create the record, and start the simulated training immediately.
async fn begin_inline(
    state: AppState,
    user: AuthUser,
    input: TrainingRequest,
) -> AppResult<(StatusCode, Json<TrainingResponse>)> {
    // Decode every payload before any side effect.
    let images = input
        .images
        .iter()
        .map(|raw| parse_data_url(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let id = new_character_id();
    let uploads = futures::future::join_all(images.iter().enumerate().map(|(index, image)| {
        let blobs = state.blobs.clone();
        let path = keys::training_image(
            &user.uid,
            &id,
            &format!("image-{index}.{}", image.extension()),
        );
        async move {
            blobs
                .put(&path, &image.bytes, &image.mime_type)
                .await
                .map(|url| (path, url))
        }
    }))
    .await;

    let mut saga = Saga::new();
    let mut paths = Vec::with_capacity(uploads.len());
    let mut urls = Vec::with_capacity(uploads.len());
    let mut failure = None;
    for result in uploads {
        match result {
            Ok((path, url)) => {
                let blobs = state.blobs.clone();
                let undo_path = path.clone();
                saga.record("delete-training-blob", move || async move {
                    blobs.delete(&undo_path).await.map_err(|e| e.to_string())
                });
                paths.push(path);
                urls.push(url);
            }
            Err(e) => failure = Some(e),
        }
    }
    if let Some(e) = failure {
        unwind(saga, "training_inline").await;
        return Err(e.into());
    }

    let mut character = Character {
        id: id.clone(),
        user_id: user.uid.clone(),
        name: input.name.clone(),
        description: String::new(),
        keywords: Vec::new(),
        image_urls: urls,
        image_paths: paths,
        status: CharacterStatus::Uploading,
        model_endpoint: None,
        created_at: Utc::now(),
        visualizations: Vec::new(),
    };
    if let Err(e) = state.store.insert(&character).await {
        unwind(saga, "training_inline").await;
        return Err(e.into());
    }
    {
        let store = state.store.clone();
        let id = id.clone();
        saga.record("delete-character-document", move || async move {
            store.delete(&id).await.map_err(|e| e.to_string())
        });
    }

    // Images are confirmed present; move straight to training.
    if let Err(e) = state
        .store
        .update_status(&id, CharacterStatus::Training, None)
        .await
    {
        unwind(saga, "training_inline").await;
        return Err(e.into());
    }
    state.trainer.schedule(id.clone());
    saga.commit();

    character.status = CharacterStatus::Training;
    tracing::info!(
        character_id = %id,
        images = character.image_paths.len(),
        "Batch training started from inline uploads"
    );
    Ok((
        StatusCode::ACCEPTED,
        Json(TrainingResponse {
            character,
            uploads: Vec::new(),
        }),
    ))
}

/// POST /api/v1/characters/training/{id}/complete
///
/// The client calls this after every signed upload succeeded. The record
/// must still be `uploading`; each declared object must now exist in blob
/// storage, otherwise the request is rejected and the status is untouched.
pub async fn complete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<CharacterId>,
) -> AppResult<(StatusCode, Json<Character>)> {
    let mut character = owned_character(&state, &user.uid, &id).await?;

    // Rejects repeat completions and terminal records.
    character
        .status
        .validate_transition(CharacterStatus::Training)?;

    for path in &character.image_paths {
        if !state.blobs.exists(path).await? {
            return Err(AppError::BadRequest(format!(
                "Uploaded image missing: {path}"
            )));
        }
    }

    state
        .store
        .update_status(&id, CharacterStatus::Training, None)
        .await?;
    state.trainer.schedule(id.clone());

    character.status = CharacterStatus::Training;
    tracing::info!(character_id = %id, "Uploads confirmed; training started");
    Ok((StatusCode::ACCEPTED, Json(character)))
}
