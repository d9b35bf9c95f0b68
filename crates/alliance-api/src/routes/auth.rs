//! Email/password login.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::extract::ApiJson;
use crate::state::AppState;

/// Login form.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

/// Identity returned with the token.
#[derive(Debug, Serialize)]
pub struct LoginUser {
    /// User ID
    pub user_id: String,
    /// Account email
    pub email: Option<String>,
}

/// Bearer token for later requests.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Access token
    pub access_token: String,
    /// Always `bearer`
    pub token_type: &'static str,
    /// Signed-in user
    pub user: LoginUser,
}

/// `POST /auth/login`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let session = state
        .authenticator
        .sign_in(&form.email, &form.password)
        .await?;
    tracing::info!(user_id = %session.user.subject, "Login");
    Ok(Json(LoginResponse {
        access_token: session.access_token,
        token_type: "bearer",
        user: LoginUser {
            user_id: session.user.subject,
            email: session.user.email,
        },
    }))
}
