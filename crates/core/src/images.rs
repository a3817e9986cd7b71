//! Inline image payload handling.
//!
//! Clients send reference images as base64 data URLs
//! (`data:image/jpeg;base64,...`); generated images travel back and forth as
//! raw base64 with a separate mime type field.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::CoreError;

/// Decoded image bytes plus their mime type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageData {
    /// Decode a raw base64 payload with an explicit mime type.
    pub fn from_base64(data: &str, mime_type: &str) -> Result<Self, CoreError> {
        let bytes = BASE64
            .decode(data.trim())
            .map_err(|e| CoreError::Validation(format!("Invalid base64 image payload: {e}")))?;
        if bytes.is_empty() {
            return Err(CoreError::Validation("Image payload is empty".into()));
        }
        Ok(Self {
            mime_type: mime_type.to_string(),
            bytes,
        })
    }

    /// Re-encode the bytes as base64 for wire transport.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    /// File extension matching the mime type, defaulting to `bin`.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "bin",
        }
    }
}

/// Parse a `data:<mime>;base64,<payload>` URL into an [`ImageData`].
pub fn parse_data_url(input: &str) -> Result<ImageData, CoreError> {
    let rest = input
        .strip_prefix("data:")
        .ok_or_else(|| CoreError::Validation("Image must be a base64 data URL".into()))?;

    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| CoreError::Validation("Malformed data URL: missing payload".into()))?;

    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| CoreError::Validation("Data URL must be base64-encoded".into()))?;

    if mime_type.is_empty() || !mime_type.starts_with("image/") {
        return Err(CoreError::Validation(format!(
            "Unsupported data URL mime type '{mime_type}'"
        )));
    }

    ImageData::from_base64(payload, mime_type)
}
