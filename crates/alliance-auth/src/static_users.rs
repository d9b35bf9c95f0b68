//! In-process password authenticator.
//!
//! Holds a fixed set of users and issues tokens signed with the same HS256
//! secret [`SupabaseJwtValidator`](crate::SupabaseJwtValidator) checks, so a
//! token from [`StaticAuthenticator::sign_in`] passes the auth middleware.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use crate::{
    AuthError, AuthenticatedUser, LoginSession, PasswordAuthenticator, SupabaseClaims,
    SUPABASE_AUDIENCE,
};

/// Lifetime of issued tokens (1 hour), as Supabase does by default.
const TOKEN_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
struct StaticUser {
    id: Uuid,
    email: String,
    password: String,
}

/// Password authenticator over a fixed user list.
pub struct StaticAuthenticator {
    users: HashMap<String, StaticUser>,
    key: EncodingKey,
}

impl StaticAuthenticator {
    /// Create an authenticator signing tokens with `secret`.
    pub fn new(secret: &str) -> Self {
        Self {
            users: HashMap::new(),
            key: EncodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Register a user. Emails are matched case-insensitively.
    pub fn with_user(mut self, id: Uuid, email: &str, password: &str) -> Self {
        self.users.insert(
            email.to_lowercase(),
            StaticUser {
                id,
                email: email.to_string(),
                password: password.to_string(),
            },
        );
        self
    }

    /// Issue an access token for a user, whether registered or not.
    pub fn issue_token(&self, user_id: Uuid, email: Option<&str>) -> Result<String, AuthError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        let claims = SupabaseClaims {
            sub: user_id.to_string(),
            email: email.map(str::to_owned),
            aud: SUPABASE_AUDIENCE.to_string(),
            exp: (now + TOKEN_TTL).as_secs(),
            iat: now.as_secs(),
            role: Some("authenticated".to_string()),
        };
        encode(&Header::default(), &claims, &self.key).map_err(|e| AuthError::Signing(e.to_string()))
    }

    fn authenticate(&self, email: &str, password: &str) -> Result<LoginSession, AuthError> {
        let user = self
            .users
            .get(&email.to_lowercase())
            .filter(|u| u.password == password)
            .ok_or(AuthError::InvalidCredentials)?;

        let access_token = self.issue_token(user.id, Some(user.email.as_str()))?;
        log::info!("Signed in {}", user.email);
        Ok(LoginSession {
            access_token,
            user: AuthenticatedUser {
                subject: user.id.to_string(),
                email: Some(user.email.clone()),
            },
        })
    }
}

impl PasswordAuthenticator for StaticAuthenticator {
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Pin<Box<dyn Future<Output = Result<LoginSession, AuthError>> + Send + '_>> {
        let result = self.authenticate(email, password);
        Box::pin(async move { result })
    }
}
