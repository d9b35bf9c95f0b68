//! GoTrue email/password sign-in.

use std::future::Future;
use std::pin::Pin;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use alliance_auth::{AuthError, AuthenticatedUser, LoginSession, PasswordAuthenticator};

use crate::error::{Result, SupabaseError};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Signs users in against the Supabase auth endpoint.
#[derive(Clone)]
pub struct SupabasePasswordAuth {
    http: Client,
    token_url: String,
    api_key: String,
}

impl std::fmt::Debug for SupabasePasswordAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabasePasswordAuth")
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}

impl SupabasePasswordAuth {
    /// Creates a client for the project at `base_url`.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        if base_url.is_empty() || api_key.is_empty() {
            return Err(SupabaseError::Config(
                "Supabase URL and key are required".to_string(),
            ));
        }
        Ok(Self {
            http: Client::new(),
            token_url: format!(
                "{}/auth/v1/token?grant_type=password",
                base_url.trim_end_matches('/')
            ),
            api_key: api_key.to_string(),
        })
    }

    async fn password_grant(
        &self,
        email: &str,
        password: &str,
    ) -> std::result::Result<LoginSession, AuthError> {
        let response = self
            .http
            .post(&self.token_url)
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY
        ) {
            tracing::info!(%status, "Password sign-in rejected");
            return Err(AuthError::InvalidCredentials);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Provider(format!("HTTP {}: {body}", status.as_u16())));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        Ok(LoginSession {
            access_token: token.access_token,
            user: AuthenticatedUser {
                subject: token.user.id,
                email: token.user.email,
            },
        })
    }
}

impl PasswordAuthenticator for SupabasePasswordAuth {
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<LoginSession, AuthError>> + Send + '_>>
    {
        let email = email.to_string();
        let password = password.to_string();
        Box::pin(async move { self.password_grant(&email, &password).await })
    }
}
