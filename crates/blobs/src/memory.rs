//! In-memory blob store for tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{Blob, BlobError, BlobStore, SignedUpload};

pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, Blob>>,
    base_url: String,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            base_url: "memory://studio".to_string(),
        }
    }
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects. Handy for side-effect assertions in tests.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, BlobError> {
        self.objects.write().await.insert(
            path.to_string(),
            Blob {
                content_type: content_type.to_string(),
                bytes: bytes.to_vec(),
            },
        );
        Ok(self.public_url(path))
    }

    async fn get(&self, path: &str) -> Result<Blob, BlobError> {
        self.objects
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| BlobError::NotFound {
                path: path.to_string(),
            })
    }

    async fn exists(&self, path: &str) -> Result<bool, BlobError> {
        Ok(self.objects.read().await.contains_key(path))
    }

    async fn delete(&self, path: &str) -> Result<(), BlobError> {
        self.objects.write().await.remove(path);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn signed_upload_url(
        &self,
        path: &str,
        content_type: &str,
        ttl_secs: u64,
    ) -> Result<SignedUpload, BlobError> {
        let now = Utc::now();
        Ok(SignedUpload {
            path: path.to_string(),
            upload_url: format!("{}/upload/{path}", self.base_url),
            public_url: self.public_url(path),
            content_type: content_type.to_string(),
            expires_at: now + chrono::Duration::seconds(ttl_secs as i64),
        })
    }
}
