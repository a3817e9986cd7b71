//! Firebase ID-token verification against Google's securetoken JWKS.
//!
//! Tokens are RS256 JWTs; the signing keys rotate, so the JWK set is
//! fetched lazily and cached. Validation pins the audience to the project
//! id and the issuer to `https://securetoken.google.com/{project}`.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::RwLock;

use super::verifier::{TokenVerifier, VerifiedIdentity, VerifyError};

const JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// How long a fetched key set is trusted before re-fetching.
const KEY_CACHE_TTL_SECS: i64 = 3600;

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Default)]
struct CachedKeys {
    keys: Vec<Jwk>,
    fetched_at: Option<DateTime<Utc>>,
}

impl CachedKeys {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.fetched_at
            .map(|t| now - t < chrono::Duration::seconds(KEY_CACHE_TTL_SECS))
            .unwrap_or(false)
    }

    fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid == kid)
    }
}

/// Claims of a Firebase ID token that matter to the gateway.
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
}

pub struct FirebaseVerifier {
    http: reqwest::Client,
    project_id: String,
    cached: RwLock<CachedKeys>,
}

impl FirebaseVerifier {
    pub fn new(http: reqwest::Client, project_id: impl Into<String>) -> Self {
        Self {
            http,
            project_id: project_id.into(),
            cached: RwLock::new(CachedKeys::default()),
        }
    }

    /// Return the JWK for `kid`, refreshing the cached set if needed.
    async fn key_for(&self, kid: &str) -> Result<Jwk, VerifyError> {
        {
            let cached = self.cached.read().await;
            if cached.is_fresh(Utc::now()) {
                if let Some(key) = cached.find(kid) {
                    return Ok(key.clone());
                }
            }
        }

        // Stale cache or unknown kid (key rotation): re-fetch.
        let set: JwkSet = self
            .http
            .get(JWKS_URL)
            .send()
            .await
            .map_err(|e| VerifyError::Unavailable(format!("JWKS fetch failed: {e}")))?
            .json()
            .await
            .map_err(|e| VerifyError::Unavailable(format!("Malformed JWKS: {e}")))?;

        let mut cached = self.cached.write().await;
        cached.keys = set.keys;
        cached.fetched_at = Some(Utc::now());

        cached
            .find(kid)
            .cloned()
            .ok_or_else(|| VerifyError::Invalid(format!("Unknown signing key '{kid}'")))
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!(
            "https://securetoken.google.com/{}",
            self.project_id
        )]);
        validation
    }
}

#[async_trait::async_trait]
impl TokenVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerifyError> {
        let header =
            decode_header(token).map_err(|e| VerifyError::Invalid(format!("Bad header: {e}")))?;
        let kid = header
            .kid
            .ok_or_else(|| VerifyError::Invalid("Token header has no kid".into()))?;

        let jwk = self.key_for(&kid).await?;
        let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|e| VerifyError::Unavailable(format!("Bad JWK components: {e}")))?;

        let data = decode::<IdTokenClaims>(token, &key, &self.validation())
            .map_err(|e| VerifyError::Invalid(e.to_string()))?;

        if data.claims.sub.is_empty() {
            return Err(VerifyError::Invalid("Token has an empty subject".into()));
        }
        Ok(VerifiedIdentity {
            uid: data.claims.sub,
        })
    }
}
