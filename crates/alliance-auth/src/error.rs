//! Auth-specific error types.

/// Errors that can occur during authentication.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AuthError {
    /// No Authorization header or bearer token present.
    #[error("Not authenticated")]
    MissingToken,

    /// Token format is invalid (not a valid JWT).
    #[error("Invalid token format: {0}")]
    InvalidFormat(String),

    /// JWT signature verification failed.
    #[error("Invalid token signature: {0}")]
    InvalidSignature(String),

    /// Token has expired.
    #[error("Token has expired")]
    Expired,

    /// Token audience doesn't match the configured audience.
    #[error("Invalid token audience")]
    InvalidAudience,

    /// Email/password pair was rejected.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The identity service could not be reached or answered unexpectedly.
    #[error("Identity provider error: {0}")]
    Provider(String),

    /// A token could not be issued.
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

impl AuthError {
    /// Whether this error should result in a 401 (vs. a 5xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AuthError::MissingToken
                | AuthError::InvalidFormat(_)
                | AuthError::InvalidSignature(_)
                | AuthError::Expired
                | AuthError::InvalidAudience
                | AuthError::InvalidCredentials
        )
    }
}
