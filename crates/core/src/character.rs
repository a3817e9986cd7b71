//! Character records, visualizations, and the training lifecycle state machine.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{CharacterId, Timestamp, UserId};

/// Minimum number of reference images required to start batch training.
pub const MIN_TRAINING_IMAGES: usize = 5;

/// A user-owned character record.
///
/// Created either by the paired-analysis flow (born `ready`, no model
/// endpoint) or by the batch-training flow (`uploading → training → ready`).
/// `visualizations` is append-only and ordered by creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: CharacterId,
    pub user_id: UserId,
    pub name: String,
    pub description: String,
    pub keywords: Vec<String>,
    /// Public read URLs for the reference images.
    pub image_urls: Vec<String>,
    /// Blob-store object keys backing `image_urls`, in the same order.
    pub image_paths: Vec<String>,
    pub status: CharacterStatus,
    /// Synthetic model endpoint attached when training completes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_endpoint: Option<String>,
    pub created_at: Timestamp,
    pub visualizations: Vec<Visualization>,
}

/// The structured result of an image-analysis inference call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterProfile {
    pub name: String,
    pub description: String,
    pub keywords: Vec<String>,
}

/// A saved AI-generated image, tied to the prompt that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visualization {
    pub id: String,
    pub image_url: String,
    pub prompt: String,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Lifecycle state machine
// ---------------------------------------------------------------------------

/// Lifecycle status of a character record.
///
/// `uploading → training → ready`; `failed` is reachable from any
/// non-terminal state. `ready` and `failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterStatus {
    Uploading,
    Training,
    Ready,
    Failed,
}

impl CharacterStatus {
    /// Returns the set of valid target statuses reachable from `self`.
    ///
    /// Terminal states return an empty slice because no further transitions
    /// are allowed.
    pub fn valid_transitions(self) -> &'static [CharacterStatus] {
        match self {
            CharacterStatus::Uploading => &[CharacterStatus::Training, CharacterStatus::Failed],
            CharacterStatus::Training => &[CharacterStatus::Ready, CharacterStatus::Failed],
            CharacterStatus::Ready | CharacterStatus::Failed => &[],
        }
    }

    /// Check whether a transition from `self` to `to` is valid.
    pub fn can_transition(self, to: CharacterStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Validate a state transition, returning a conflict error for invalid ones.
    pub fn validate_transition(self, to: CharacterStatus) -> Result<(), CoreError> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(CoreError::Conflict(format!(
                "Invalid status transition: {} -> {}",
                self.as_str(),
                to.as_str()
            )))
        }
    }

    /// Whether this status admits no further transitions.
    pub fn is_terminal(self) -> bool {
        self.valid_transitions().is_empty()
    }

    /// Wire/document representation.
    pub fn as_str(self) -> &'static str {
        match self {
            CharacterStatus::Uploading => "uploading",
            CharacterStatus::Training => "training",
            CharacterStatus::Ready => "ready",
            CharacterStatus::Failed => "failed",
        }
    }

    /// Parse from the document representation.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "uploading" => Ok(CharacterStatus::Uploading),
            "training" => Ok(CharacterStatus::Training),
            "ready" => Ok(CharacterStatus::Ready),
            "failed" => Ok(CharacterStatus::Failed),
            other => Err(CoreError::Validation(format!(
                "Unknown character status '{other}'"
            ))),
        }
    }
}
