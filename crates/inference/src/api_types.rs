//! Request/response types for the `generateContent` API.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Structured profile payload the analysis call asks the model to emit.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePayload {
    pub character_name: String,
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Response schema constraining the analysis call's JSON output.
pub fn profile_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "characterName": { "type": "STRING" },
            "description": { "type": "STRING" },
            "keywords": { "type": "ARRAY", "items": { "type": "STRING" } },
        },
        "required": ["characterName", "description", "keywords"],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_camel_case_inline_data() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::inline_data("image/png", "QUJD"),
                    Part::text("describe this"),
                ],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".into()),
                response_schema: Some(profile_response_schema()),
                response_modalities: None,
            }),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value["contents"][0]["parts"][0]["inlineData"]["mimeType"],
            "image/png"
        );
        assert_eq!(value["contents"][0]["parts"][1]["text"], "describe this");
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        // Unset options stay off the wire.
        assert!(value["generationConfig"]
            .as_object()
            .unwrap()
            .get("responseModalities")
            .is_none());
    }

    #[test]
    fn response_parses_image_candidate() {
        let raw = r#"{
            "candidates": [{
                "content": { "parts": [
                    { "inlineData": { "mimeType": "image/png", "data": "QUJD" } }
                ] }
            }]
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let part = &response.candidates[0].content.as_ref().unwrap().parts[0];
        assert_eq!(part.inline_data.as_ref().unwrap().data, "QUJD");
    }

    #[test]
    fn profile_payload_parses_model_output() {
        let raw = r#"{
            "characterName": "Captain Nova",
            "description": "A daring explorer",
            "keywords": ["space", "heroic"]
        }"#;
        let payload: ProfilePayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.character_name, "Captain Nova");
        assert_eq!(payload.keywords.len(), 2);
    }
}
