//! Authenticated user identity and extraction helpers.

use uuid::Uuid;

use crate::AuthError;

/// An authenticated user identity, extracted from a validated token.
///
/// Stored in HTTP request extensions by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// The user's unique subject identifier (from the `sub` claim).
    pub subject: String,
    /// The user's email address, when the token carries one.
    pub email: Option<String>,
}

impl AuthenticatedUser {
    /// The subject parsed as the user UUID.
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.subject)
            .map_err(|_| AuthError::InvalidFormat("subject is not a UUID".to_string()))
    }
}

/// Extract the `AuthenticatedUser` from HTTP request `Parts`, if present.
pub fn user_from_parts(parts: &http::request::Parts) -> Option<&AuthenticatedUser> {
    parts.extensions.get::<AuthenticatedUser>()
}
