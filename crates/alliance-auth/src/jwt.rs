//! Supabase access-token validation.
//!
//! Supabase signs access tokens with the project's JWT secret (HS256). The
//! `sub` claim is the user UUID and `aud` is `authenticated`.

use std::future::Future;
use std::pin::Pin;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::{AuthConfig, AuthError, AuthenticatedUser, TokenValidator};

/// Claims read from (and written into) Supabase access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseClaims {
    /// User UUID.
    pub sub: String,
    /// User email, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Audience.
    pub aud: String,
    /// Expiry, seconds since the epoch.
    pub exp: u64,
    /// Issue time, seconds since the epoch.
    #[serde(default)]
    pub iat: u64,
    /// Postgres role the token maps to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Validates HS256 tokens signed with the Supabase JWT secret.
pub struct SupabaseJwtValidator {
    key: DecodingKey,
}

impl SupabaseJwtValidator {
    /// Create a validator for the given JWT secret.
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Decode and verify a token.
    pub fn validate_token(&self, token: &str, audience: &str) -> Result<AuthenticatedUser, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);

        let token_data = decode::<SupabaseClaims>(token, &self.key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidAudience => AuthError::InvalidAudience,
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => AuthError::InvalidFormat(e.to_string()),
                _ => AuthError::InvalidSignature(e.to_string()),
            }
        })?;

        let claims = token_data.claims;
        if claims.sub.is_empty() {
            return Err(AuthError::InvalidFormat("missing sub claim".to_string()));
        }

        log::debug!("Validated access token for subject {}", claims.sub);
        Ok(AuthenticatedUser {
            subject: claims.sub,
            email: claims.email,
        })
    }
}

impl TokenValidator for SupabaseJwtValidator {
    fn validate(
        &self,
        token: &str,
        config: &AuthConfig,
    ) -> Pin<Box<dyn Future<Output = Result<AuthenticatedUser, AuthError>> + Send + '_>> {
        let result = self.validate_token(token, &config.audience);
        Box::pin(async move { result })
    }
}
