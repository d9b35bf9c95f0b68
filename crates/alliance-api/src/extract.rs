//! Request extractors.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::Json;
use http::request::Parts;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use alliance_auth::user_from_parts;
use alliance_core::accounts::ensure_profile;
use alliance_core::Profile;

use crate::error::ApiError;
use crate::state::AppState;

/// The signed-in user with their profile, created on first use.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// User ID from the token subject
    pub user_id: Uuid,
    /// Stored profile
    pub profile: Profile,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = user_from_parts(parts)
            .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;
        let user_id = user.user_id()?;
        let profile = ensure_profile(state.store.as_ref(), user_id, user.email.as_deref()).await?;
        Ok(Self { user_id, profile })
    }
}

/// A [`CurrentUser`] with the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if !user.profile.is_admin() {
            tracing::info!(user_id = %user.user_id, "Admin route refused");
            return Err(ApiError::forbidden("Admin only"));
        }
        Ok(Self(user))
    }
}

/// JSON body whose rejections answer 422 with a `detail` message.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    match &rejection {
        JsonRejection::MissingJsonContentType(_) => ApiError::BadRequest(rejection.body_text()),
        _ => ApiError::Unprocessable(rejection.body_text()),
    }
}

/// Path parameters whose rejections answer 422 with a `detail` message.
#[derive(Debug, Clone)]
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| Self(value))
            .map_err(|rejection: PathRejection| ApiError::Unprocessable(rejection.body_text()))
    }
}
