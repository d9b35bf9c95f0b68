//! Authentication primitives for ALLIANCE OSTEO.
//!
//! Provides:
//! - [`AuthenticatedUser`]: Identity extracted from a validated token
//! - [`TokenValidator`]: Trait for async token validation
//! - [`SupabaseJwtValidator`]: HS256 validation of Supabase access tokens
//! - [`AuthLayer`] / [`AuthService`]: Tower middleware parameterised over `TokenValidator`
//! - [`PasswordAuthenticator`]: Email/password sign-in, with [`StaticAuthenticator`]
//!   as an in-process implementation
//! - [`AuthError`]: Auth-specific error types

mod error;
mod jwt;
mod middleware;
mod static_users;
mod user;

use std::future::Future;
use std::pin::Pin;

pub use error::AuthError;
pub use jwt::{SupabaseClaims, SupabaseJwtValidator};
pub use middleware::{AuthLayer, AuthService};
pub use static_users::StaticAuthenticator;
pub use user::{user_from_parts, AuthenticatedUser};

/// Audience Supabase puts in tokens issued to signed-in users.
pub const SUPABASE_AUDIENCE: &str = "authenticated";

/// Configuration for the auth middleware.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Expected `aud` claim.
    pub audience: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            audience: SUPABASE_AUDIENCE.to_string(),
        }
    }
}

/// Trait for validating tokens and extracting user identity.
///
/// The middleware calls `validate()` with the bearer token and stores
/// the authenticated user in the request extensions on success.
pub trait TokenValidator: Send + Sync + 'static {
    /// Validate a token and return the authenticated user.
    fn validate(
        &self,
        token: &str,
        config: &AuthConfig,
    ) -> Pin<Box<dyn Future<Output = Result<AuthenticatedUser, AuthError>> + Send + '_>>;
}

/// A successful email/password sign-in.
#[derive(Debug, Clone)]
pub struct LoginSession {
    /// Bearer token to send on later requests.
    pub access_token: String,
    /// The signed-in user.
    pub user: AuthenticatedUser,
}

/// Trait for exchanging an email and password for an access token.
pub trait PasswordAuthenticator: Send + Sync + 'static {
    /// Sign in; wrong credentials yield [`AuthError::InvalidCredentials`].
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Pin<Box<dyn Future<Output = Result<LoginSession, AuthError>> + Send + '_>>;
}
