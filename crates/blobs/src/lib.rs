//! Image blob storage.
//!
//! [`BlobStore`] is the seam between the gateway and object storage. The
//! production implementation talks to Google Cloud Storage; the in-memory
//! implementation backs tests and local development.
//!
//! Object keys follow `{category}/{userId}/{characterId}/{file}`.

use std::sync::Arc;

use async_trait::async_trait;
use studio_core::types::Timestamp;

pub mod gcs;
pub mod keys;
pub mod memory;
pub mod sign;

pub use gcs::GcsStore;
pub use memory::MemoryBlobStore;

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("Object not found: {path}")]
    NotFound { path: String },

    /// Signing or backend configuration is missing/invalid.
    #[error("Blob configuration error: {0}")]
    Config(String),

    /// The storage service rejected or failed the request.
    #[error("Blob upstream error: {0}")]
    Upstream(String),
}

/// A stored object's bytes plus its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A time-limited capability URL granting one unauthenticated PUT, together
/// with the object's long-lived public read URL.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUpload {
    pub path: String,
    pub upload_url: String,
    pub public_url: String,
    pub content_type: String,
    pub expires_at: Timestamp,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under `path`, returning the public read URL.
    async fn put(&self, path: &str, bytes: &[u8], content_type: &str)
        -> Result<String, BlobError>;

    async fn get(&self, path: &str) -> Result<Blob, BlobError>;

    async fn exists(&self, path: &str) -> Result<bool, BlobError>;

    async fn delete(&self, path: &str) -> Result<(), BlobError>;

    /// Public read URL for `path` (no existence check).
    fn public_url(&self, path: &str) -> String;

    /// Mint a short-lived signed PUT URL for `path`.
    async fn signed_upload_url(
        &self,
        path: &str,
        content_type: &str,
        ttl_secs: u64,
    ) -> Result<SignedUpload, BlobError>;
}

/// Shared handle used by the gateway state.
pub type DynBlobStore = Arc<dyn BlobStore>;
