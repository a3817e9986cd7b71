#[derive(Debug, thiserror::Error)]
pub enum GcpError {
    /// Service-account key missing, unreadable, or malformed.
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// Failed to sign or exchange the JWT assertion.
    #[error("Token error: {0}")]
    Token(String),

    /// Transport-level failure talking to the token endpoint.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
