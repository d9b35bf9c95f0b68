//! HTTP error mapping.
//!
//! Every failure answers `{"detail": "<message>"}` with the status of its
//! variant.

use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde_json::json;

use alliance_auth::AuthError;
use alliance_llm::LlmError;

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by handlers.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ApiError {
    /// 400
    #[error("{0}")]
    BadRequest(String),

    /// 401
    #[error("{0}")]
    Unauthorized(String),

    /// 403
    #[error("{0}")]
    Forbidden(String),

    /// 404
    #[error("{0}")]
    NotFound(String),

    /// 422
    #[error("{0}")]
    Unprocessable(String),

    /// 503
    #[error("{0}")]
    Unavailable(String),

    /// 500
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// The HTTP status of this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Creates a 404 error.
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        ApiError::NotFound(message.into())
    }

    /// Creates a 403 error.
    pub fn forbidden<S: Into<String>>(message: S) -> Self {
        ApiError::Forbidden(message.into())
    }
}

impl From<alliance_core::Error> for ApiError {
    fn from(err: alliance_core::Error) -> Self {
        use alliance_core::Error;
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            Error::InvalidState(msg) => ApiError::BadRequest(msg),
            err @ Error::Validation { .. } => ApiError::Unprocessable(err.to_string()),
            other => {
                tracing::error!(error = %other, "Storage failure");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if err.is_client_error() {
            ApiError::Unauthorized(err.to_string())
        } else {
            ApiError::Unavailable(err.to_string())
        }
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::MissingApiKey => {
                ApiError::Unavailable("AI service unavailable (missing API key)".to_string())
            }
            LlmError::QuotaExceeded { .. } => ApiError::Unavailable(
                "AI service temporarily unavailable (quota exceeded)".to_string(),
            ),
            LlmError::ModelNotFound { .. } => ApiError::Unavailable(
                "AI model not available (check model id/version)".to_string(),
            ),
            other => ApiError::Internal(format!("AI generation failed: {other}")),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(%status, error = %self, "Request failed");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
