//! Google Cloud plumbing shared by the Firestore and Cloud Storage clients.
//!
//! Provides service-account credential loading and a cached OAuth2 access
//! token provider using the signed-JWT bearer grant.

pub mod credentials;
pub mod error;
pub mod token;

pub use credentials::ServiceAccountKey;
pub use error::GcpError;
pub use token::TokenProvider;

/// OAuth scope covering Firestore and Cloud Storage.
pub const SCOPE_CLOUD_PLATFORM: &str = "https://www.googleapis.com/auth/cloud-platform";
