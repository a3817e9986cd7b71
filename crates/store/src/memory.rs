//! In-memory character store for tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use studio_core::character::{Character, CharacterStatus, Visualization};
use tokio::sync::RwLock;

use crate::{CharacterStore, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, Character>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records. Handy for side-effect assertions in tests.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl CharacterStore for MemoryStore {
    async fn insert(&self, character: &Character) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert(character.id.clone(), character.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Character>, StoreError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Character>, StoreError> {
        let mut characters: Vec<Character> = self
            .records
            .read()
            .await
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        characters.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(characters)
    }

    async fn update_status(
        &self,
        id: &str,
        status: CharacterStatus,
        model_endpoint: Option<String>,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let character = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;

        character.status.validate_transition(status)?;
        character.status = status;
        if model_endpoint.is_some() {
            character.model_endpoint = model_endpoint;
        }
        Ok(())
    }

    async fn append_visualization(
        &self,
        id: &str,
        visualization: &Visualization,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let character = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        character.visualizations.push(visualization.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.records.write().await.remove(id);
        Ok(())
    }
}
