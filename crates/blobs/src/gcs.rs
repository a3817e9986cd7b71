//! Google Cloud Storage implementation of [`BlobStore`].
//!
//! Objects are addressed as `https://storage.googleapis.com/{bucket}/{path}`
//! for upload, download, existence, and delete (XML API verbs with a bearer
//! token); signed upload URLs are minted locally via [`crate::sign`].
//! Public read URLs assume the bucket grants public read, which is how the
//! source system served character imagery.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use studio_gcp::TokenProvider;

use crate::sign::{signed_put_url, HmacKey};
use crate::{Blob, BlobError, BlobStore, SignedUpload};

const STORAGE_HOST: &str = "https://storage.googleapis.com";

pub struct GcsStore {
    http: reqwest::Client,
    tokens: Arc<TokenProvider>,
    bucket: String,
    /// HMAC interop key; without it signed uploads are unavailable.
    hmac_key: Option<HmacKey>,
}

impl GcsStore {
    pub fn new(
        http: reqwest::Client,
        tokens: Arc<TokenProvider>,
        bucket: impl Into<String>,
        hmac_key: Option<HmacKey>,
    ) -> Self {
        Self {
            http,
            tokens,
            bucket: bucket.into(),
            hmac_key,
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!("{STORAGE_HOST}/{}/{path}", self.bucket)
    }

    async fn bearer(&self) -> Result<String, BlobError> {
        self.tokens
            .access_token()
            .await
            .map_err(|e| BlobError::Upstream(e.to_string()))
    }
}

#[async_trait]
impl BlobStore for GcsStore {
    async fn put(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, BlobError> {
        let token = self.bearer().await?;
        let response = self
            .http
            .put(self.object_url(path))
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| BlobError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, path, body = %body, "GCS upload failed");
            return Err(BlobError::Upstream(format!("GCS returned {status}")));
        }
        Ok(self.public_url(path))
    }

    async fn get(&self, path: &str) -> Result<Blob, BlobError> {
        let token = self.bearer().await?;
        let response = self
            .http
            .get(self.object_url(path))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| BlobError::Upstream(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BlobError::NotFound {
                path: path.to_string(),
            });
        }
        if !status.is_success() {
            return Err(BlobError::Upstream(format!("GCS returned {status}")));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| BlobError::Upstream(e.to_string()))?
            .to_vec();
        Ok(Blob {
            content_type,
            bytes,
        })
    }

    async fn exists(&self, path: &str) -> Result<bool, BlobError> {
        let token = self.bearer().await?;
        let response = self
            .http
            .head(self.object_url(path))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| BlobError::Upstream(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(true),
            reqwest::StatusCode::NOT_FOUND => Ok(false),
            status => Err(BlobError::Upstream(format!("GCS returned {status}"))),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), BlobError> {
        let token = self.bearer().await?;
        let response = self
            .http
            .delete(self.object_url(path))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| BlobError::Upstream(e.to_string()))?;

        // Absent objects are fine for compensation.
        match response.status() {
            status if status.is_success() => Ok(()),
            reqwest::StatusCode::NOT_FOUND => Ok(()),
            status => Err(BlobError::Upstream(format!("GCS returned {status}"))),
        }
    }

    fn public_url(&self, path: &str) -> String {
        self.object_url(path)
    }

    async fn signed_upload_url(
        &self,
        path: &str,
        content_type: &str,
        ttl_secs: u64,
    ) -> Result<SignedUpload, BlobError> {
        let key = self.hmac_key.as_ref().ok_or_else(|| {
            BlobError::Config("GCS_HMAC_ACCESS_ID / GCS_HMAC_SECRET not configured".into())
        })?;

        let now = Utc::now();
        let upload_url = signed_put_url(key, &self.bucket, path, ttl_secs, now);
        Ok(SignedUpload {
            path: path.to_string(),
            upload_url,
            public_url: self.public_url(path),
            content_type: content_type.to_string(),
            expires_at: now + chrono::Duration::seconds(ttl_secs as i64),
        })
    }
}
