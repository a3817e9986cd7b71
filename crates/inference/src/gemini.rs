//! Gemini `generateContent` implementation of [`InferenceClient`].

use async_trait::async_trait;
use studio_core::character::CharacterProfile;
use studio_core::images::ImageData;

use crate::api_types::{
    profile_response_schema, ApiErrorResponse, Content, GenerateContentRequest,
    GenerateContentResponse, GenerationConfig, Part, ProfilePayload,
};
use crate::{InferenceClient, InferenceError};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_ANALYSIS_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// Instruction sent with every analysis call. The response schema pins the
/// output shape; the prompt pins the content.
const ANALYSIS_PROMPT: &str = "Analyze this character image and describe it. Provide a creative \
     name, a short compelling description, and 5-7 relevant keywords.";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub analysis_model: String,
    pub image_model: String,
}

impl GeminiConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                 | Required | Default                   |
    /// |-------------------------|----------|---------------------------|
    /// | `GEMINI_API_KEY`        | **yes**  | --                        |
    /// | `GEMINI_ANALYSIS_MODEL` | no       | `gemini-2.5-flash`        |
    /// | `GEMINI_IMAGE_MODEL`    | no       | `gemini-2.5-flash-image`  |
    ///
    /// # Panics
    ///
    /// Panics if `GEMINI_API_KEY` is not set or is empty.
    pub fn from_env() -> Self {
        let api_key =
            std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY must be set in the environment");
        assert!(!api_key.is_empty(), "GEMINI_API_KEY must not be empty");

        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            analysis_model: std::env::var("GEMINI_ANALYSIS_MODEL")
                .unwrap_or_else(|_| DEFAULT_ANALYSIS_MODEL.to_string()),
            image_model: std::env::var("GEMINI_IMAGE_MODEL")
                .unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.to_string()),
        }
    }
}

pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, config: GeminiConfig) -> Self {
        Self { http, config }
    }

    /// Resolve a model reference to its URL path segment.
    ///
    /// Bare names become `models/{name}`; trained endpoints of the form
    /// `projects/.../models/...` are used as-is.
    fn model_path(model: &str) -> String {
        if model.contains('/') {
            model.to_string()
        } else {
            format!("models/{model}")
        }
    }

    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, InferenceError> {
        let url = format!(
            "{}/{}:generateContent",
            self.config.base_url,
            Self::model_path(model)
        );

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(|e| InferenceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            tracing::error!(%status, model, message = %message, "Model call failed");
            return Err(InferenceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| InferenceError::Decode(format!("Invalid model response: {e}")))
    }

    /// First text part of the first candidate.
    fn first_text(response: &GenerateContentResponse) -> Option<&str> {
        response
            .candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|p| p.text.as_deref())
    }

    /// First inline-data part of the first candidate.
    fn first_inline_data(
        response: &GenerateContentResponse,
    ) -> Option<&crate::api_types::InlineData> {
        response
            .candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|p| p.inline_data.as_ref())
    }
}

#[async_trait]
impl InferenceClient for GeminiClient {
    async fn describe_character(
        &self,
        image: &ImageData,
    ) -> Result<CharacterProfile, InferenceError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::inline_data(&image.mime_type, image.to_base64()),
                    Part::text(ANALYSIS_PROMPT),
                ],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(profile_response_schema()),
                response_modalities: None,
            }),
        };

        let response = self.generate(&self.config.analysis_model, &request).await?;
        let text = Self::first_text(&response).ok_or_else(|| {
            InferenceError::EmptyResponse("analysis produced no text part".into())
        })?;

        let payload: ProfilePayload = serde_json::from_str(text).map_err(|e| {
            InferenceError::Decode(format!("Analysis response was not valid JSON: {e}"))
        })?;

        Ok(CharacterProfile {
            name: payload.character_name,
            description: payload.description,
            keywords: payload.keywords,
        })
    }

    async fn render_character(
        &self,
        image: &ImageData,
        prompt: &str,
        model_override: Option<&str>,
    ) -> Result<ImageData, InferenceError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::inline_data(&image.mime_type, image.to_base64()),
                    Part::text(prompt),
                ],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: None,
                response_schema: None,
                response_modalities: Some(vec!["IMAGE".to_string()]),
            }),
        };

        let model = model_override.unwrap_or(&self.config.image_model);
        let response = self.generate(model, &request).await?;
        let inline = Self::first_inline_data(&response).ok_or_else(|| {
            InferenceError::EmptyResponse("no image was generated by the model".into())
        })?;

        ImageData::from_base64(&inline.data, &inline.mime_type)
            .map_err(|e| InferenceError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_model_names_get_the_models_prefix() {
        assert_eq!(
            GeminiClient::model_path("gemini-2.5-flash"),
            "models/gemini-2.5-flash"
        );
    }

    #[test]
    fn trained_endpoints_pass_through_unchanged() {
        let endpoint = "projects/demo/models/character-abc";
        assert_eq!(GeminiClient::model_path(endpoint), endpoint);
    }
}
