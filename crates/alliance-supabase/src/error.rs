//! Error types for the Supabase backend.

use serde::Deserialize;

/// Errors raised by PostgREST and GoTrue calls.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SupabaseError {
    /// The request never got an answer.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// PostgREST answered with an error object.
    #[error("{0}")]
    Api(ApiErrorBody),

    /// A non-JSON error answer.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The answer could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The client is misconfigured.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience `Result` type alias for Supabase operations.
pub type Result<T> = std::result::Result<T, SupabaseError>;

/// PostgREST error payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiErrorBody {
    /// HTTP status, filled in by the client
    #[serde(skip)]
    pub status: u16,
    /// Postgres / PostgREST error code, e.g. `23505`
    #[serde(default)]
    pub code: Option<String>,
    /// Error message
    #[serde(default)]
    pub message: Option<String>,
    /// Hint
    #[serde(default)]
    pub hint: Option<String>,
    /// Details
    #[serde(default)]
    pub details: Option<String>,
}

impl std::fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = self.code.as_ref().map(|c| format!("code={c}"));
        let parts: Vec<&str> = [
            code.as_deref(),
            self.message.as_deref(),
            self.hint.as_deref(),
            self.details.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|p| !p.is_empty())
        .collect();
        write!(f, "HTTP {}: {}", self.status, parts.join(" | "))
    }
}

/// Postgres unique-violation code.
const UNIQUE_VIOLATION: &str = "23505";

impl SupabaseError {
    /// Builds an error from a failed response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(mut api) if api.code.is_some() || api.message.is_some() => {
                api.status = status;
                SupabaseError::Api(api)
            }
            _ => SupabaseError::Status {
                status,
                body: body.to_string(),
            },
        }
    }

    /// Whether the error is a unique-constraint conflict.
    pub fn is_conflict(&self) -> bool {
        match self {
            SupabaseError::Api(api) => {
                api.status == 409 || api.code.as_deref() == Some(UNIQUE_VIOLATION)
            }
            SupabaseError::Status { status, .. } => *status == 409,
            _ => false,
        }
    }

    /// Returns whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SupabaseError::Http(_) => true,
            SupabaseError::Api(api) => api.status >= 500,
            SupabaseError::Status { status, .. } => *status >= 500,
            SupabaseError::Decode(_) | SupabaseError::Config(_) => false,
        }
    }
}

impl From<SupabaseError> for alliance_core::Error {
    fn from(err: SupabaseError) -> Self {
        alliance_core::Error::store_with_source(err.to_string(), err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_parses_postgrest_body() {
        let err = SupabaseError::from_response(
            409,
            r#"{"code":"23505","message":"duplicate key value","details":"Key (session_id)=(x) already exists.","hint":null}"#,
        );
        assert!(err.is_conflict());
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "HTTP 409: code=23505 | duplicate key value | Key (session_id)=(x) already exists."
        );
    }

    #[test]
    fn test_from_response_plain_body() {
        let err = SupabaseError::from_response(502, "Bad Gateway");
        assert!(matches!(err, SupabaseError::Status { status: 502, .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_into_core_error() {
        let core: alliance_core::Error = SupabaseError::Decode("bad row".into()).into();
        assert!(core.is_retryable());
        assert!(core.to_string().contains("bad row"));
    }
}
