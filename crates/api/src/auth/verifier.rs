//! Token verification seam.

use std::sync::Arc;

use async_trait::async_trait;
use studio_core::types::UserId;

/// Decoded identity attached to authenticated requests.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub uid: UserId,
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The token failed validation.
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// The verifier could not reach its key source.
    #[error("Verification unavailable: {0}")]
    Unavailable(String),
}

/// Verifies a bearer token against the identity provider.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerifyError>;
}

/// Shared handle used by the gateway state.
pub type DynTokenVerifier = Arc<dyn TokenVerifier>;

/// Fixed-identity verifier for local development and tests.
///
/// With `expected_token` set, only that exact token is accepted (lets tests
/// exercise the invalid-token path); with `None`, any non-empty token maps
/// to the configured uid, which is the emulator-bypass behaviour.
pub struct StaticVerifier {
    uid: UserId,
    expected_token: Option<String>,
}

impl StaticVerifier {
    /// Accept any non-empty token as `uid`.
    pub fn allow_all(uid: impl Into<UserId>) -> Self {
        Self {
            uid: uid.into(),
            expected_token: None,
        }
    }

    /// Accept only `token` as `uid`.
    pub fn expecting(uid: impl Into<UserId>, token: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            expected_token: Some(token.into()),
        }
    }
}

#[async_trait]
impl TokenVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerifyError> {
        if token.is_empty() {
            return Err(VerifyError::Invalid("empty token".into()));
        }
        if let Some(expected) = &self.expected_token {
            if token != expected {
                return Err(VerifyError::Invalid("token mismatch".into()));
            }
        }
        Ok(VerifiedIdentity {
            uid: self.uid.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allow_all_accepts_any_token() {
        let verifier = StaticVerifier::allow_all("local-user");
        let identity = verifier.verify("anything").await.unwrap();
        assert_eq!(identity.uid, "local-user");
    }

    #[tokio::test]
    async fn expecting_rejects_other_tokens() {
        let verifier = StaticVerifier::expecting("u", "secret");
        assert!(verifier.verify("secret").await.is_ok());
        assert!(verifier.verify("wrong").await.is_err());
        assert!(verifier.verify("").await.is_err());
    }
}
