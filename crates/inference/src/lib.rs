//! Generative-model inference client.
//!
//! [`InferenceClient`] wraps the two model interactions the product needs:
//! describing a reference image as a structured character profile, and
//! rendering a new image from a reference image plus a prompt. The
//! production implementation calls Gemini's `generateContent` API;
//! [`ScriptedClient`] returns canned outcomes for tests.

use std::sync::Arc;

use async_trait::async_trait;
use studio_core::character::CharacterProfile;
use studio_core::images::ImageData;

pub mod api_types;
pub mod gemini;
pub mod scripted;

pub use gemini::{GeminiClient, GeminiConfig};
pub use scripted::ScriptedClient;

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// Transport-level failure reaching the model endpoint.
    #[error("Inference transport error: {0}")]
    Transport(String),

    /// The model API returned an error status.
    #[error("Inference API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The model responded without the requested payload.
    #[error("Empty model response: {0}")]
    EmptyResponse(String),

    /// The model's output could not be decoded as requested.
    #[error("Malformed model output: {0}")]
    Decode(String),
}

#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Analyze a reference image into a structured character profile.
    async fn describe_character(
        &self,
        image: &ImageData,
    ) -> Result<CharacterProfile, InferenceError>;

    /// Render a new image of the character from a reference image and a
    /// free-text prompt. `model_override` selects a trained model endpoint
    /// when the character has one.
    async fn render_character(
        &self,
        image: &ImageData,
        prompt: &str,
        model_override: Option<&str>,
    ) -> Result<ImageData, InferenceError>;
}

/// Shared handle used by the gateway state.
pub type DynInferenceClient = Arc<dyn InferenceClient>;
