//! Cached OAuth2 access tokens via the signed-JWT bearer grant.
//!
//! The provider signs an RS256 assertion with the service-account key,
//! exchanges it at the token endpoint, and caches the result until shortly
//! before expiry. One provider instance is shared by all Google clients.

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::credentials::ServiceAccountKey;
use crate::error::GcpError;

/// Assertion lifetime requested from the token endpoint.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Refresh tokens this many seconds before they actually expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Claims of the JWT bearer assertion.
#[derive(Debug, Serialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - chrono::Duration::seconds(EXPIRY_MARGIN_SECS) > now
    }
}

/// Mints and caches OAuth2 access tokens for one scope.
pub struct TokenProvider {
    http: reqwest::Client,
    key: ServiceAccountKey,
    scope: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(http: reqwest::Client, key: ServiceAccountKey, scope: impl Into<String>) -> Self {
        Self {
            http,
            key,
            scope: scope.into(),
            cached: Mutex::new(None),
        }
    }

    /// Return a valid access token, refreshing it if the cached one is
    /// missing or about to expire.
    pub async fn access_token(&self) -> Result<String, GcpError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref() {
            if token.is_fresh(now) {
                return Ok(token.value.clone());
            }
        }

        let assertion = self.signed_assertion(now)?;
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GcpError::Token(format!(
                "Token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GcpError::Token(format!("Malformed token response: {e}")))?;

        tracing::debug!(
            scope = %self.scope,
            expires_in = token.expires_in,
            "Obtained access token"
        );

        let entry = CachedToken {
            value: token.access_token,
            expires_at: now + chrono::Duration::seconds(token.expires_in),
        };
        let value = entry.value.clone();
        *cached = Some(entry);
        Ok(value)
    }

    /// Build and sign the RS256 assertion for the bearer grant.
    fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String, GcpError> {
        let claims = self.assertion_claims(now);
        let encoding_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| GcpError::Credentials(format!("Invalid RSA private key: {e}")))?;
        encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
            .map_err(|e| GcpError::Token(format!("Failed to sign assertion: {e}")))
    }

    fn assertion_claims(&self, now: DateTime<Utc>) -> AssertionClaims {
        AssertionClaims {
            iss: self.key.client_email.clone(),
            scope: self.scope.clone(),
            aud: self.key.token_uri.clone(),
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        }
    }
}
