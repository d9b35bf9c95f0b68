//! Error types for LLM providers.

/// Errors raised while talking to a model.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LlmError {
    /// No API key is configured.
    #[error("AI service unavailable (missing API key)")]
    MissingApiKey,

    /// Rate limit or quota exhausted.
    #[error("AI service temporarily unavailable (quota exceeded)")]
    QuotaExceeded {
        /// Provider message
        message: String,
    },

    /// The configured model does not exist.
    #[error("AI model not available: {model}")]
    ModelNotFound {
        /// Model identifier that was requested
        model: String,
    },

    /// The model answered with no text.
    #[error("AI returned an empty response")]
    EmptyResponse,

    /// Any other error answer from the provider.
    #[error("AI provider error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Provider message
        message: String,
    },

    /// The request never got an answer.
    #[error("AI transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The answer could not be decoded.
    #[error("AI response could not be decoded: {0}")]
    Decode(String),
}

/// Convenience `Result` type alias for LLM operations.
pub type Result<T> = std::result::Result<T, LlmError>;

impl LlmError {
    /// Creates a decode error.
    pub fn decode<S: Into<String>>(message: S) -> Self {
        LlmError::Decode(message.into())
    }

    /// Returns whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Transport(_) => true,
            LlmError::Api { status, .. } => *status >= 500,
            LlmError::MissingApiKey
            | LlmError::QuotaExceeded { .. }
            | LlmError::ModelNotFound { .. }
            | LlmError::EmptyResponse
            | LlmError::Decode(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(LlmError::Api {
            status: 503,
            message: "overloaded".into()
        }
        .is_retryable());
        assert!(!LlmError::Api {
            status: 400,
            message: "bad request".into()
        }
        .is_retryable());
        assert!(!LlmError::QuotaExceeded {
            message: "quota".into()
        }
        .is_retryable());
        assert!(!LlmError::MissingApiKey.is_retryable());
        assert!(!LlmError::decode("bad json").is_retryable());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            LlmError::ModelNotFound {
                model: "gemini-9".into()
            }
            .to_string(),
            "AI model not available: gemini-9"
        );
    }
}
