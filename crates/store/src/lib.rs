//! Character document persistence.
//!
//! [`CharacterStore`] is the seam between the gateway and the document
//! database. The production implementation talks to Firestore over REST;
//! [`MemoryStore`] backs tests and local development.

use std::sync::Arc;

use async_trait::async_trait;
use studio_core::character::{Character, CharacterStatus, Visualization};
use studio_core::error::CoreError;

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Character not found: {id}")]
    NotFound { id: String },

    /// Attempted lifecycle transition rejected by the state machine.
    #[error("Invalid transition: {0}")]
    Transition(String),

    /// Stored document could not be decoded into a [`Character`].
    #[error("Decode error: {0}")]
    Decode(String),

    /// The document service rejected or failed the request.
    #[error("Store upstream error: {0}")]
    Upstream(String),
}

impl From<CoreError> for StoreError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Conflict(msg) => StoreError::Transition(msg),
            other => StoreError::Upstream(other.to_string()),
        }
    }
}

/// Document-store operations for character records.
///
/// Every mutation that changes `status` must validate the transition via
/// [`CharacterStatus::validate_transition`]. `append_visualization` is
/// append-only; entries are never edited in place.
#[async_trait]
pub trait CharacterStore: Send + Sync {
    async fn insert(&self, character: &Character) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Character>, StoreError>;

    /// All characters owned by `user_id`, newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Character>, StoreError>;

    async fn update_status(
        &self,
        id: &str,
        status: CharacterStatus,
        model_endpoint: Option<String>,
    ) -> Result<(), StoreError>;

    async fn append_visualization(
        &self,
        id: &str,
        visualization: &Visualization,
    ) -> Result<(), StoreError>;

    /// Remove a record. Used only by compensation flows.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// Shared handle used by the gateway state.
pub type DynCharacterStore = Arc<dyn CharacterStore>;
