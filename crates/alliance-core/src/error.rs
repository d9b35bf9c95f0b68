//! Error types for the ALLIANCE OSTEO core library.

/// Errors raised by program rules and storage backends.
///
/// The `Display` text of the rule variants is user-facing: the HTTP layer
/// forwards it verbatim as the response `detail`.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The requested entity does not exist (or is not visible to the caller).
    #[error("{0}")]
    NotFound(String),

    /// The caller is not allowed to perform the operation right now
    /// (locked session, weekly limit, ordering rules).
    #[error("{0}")]
    Forbidden(String),

    /// The entity is in a state that makes the operation meaningless.
    #[error("{0}")]
    InvalidState(String),

    /// Input failed a domain constraint.
    #[error("Validation error: {message}")]
    Validation {
        /// Field that failed validation, if known
        field: Option<String>,
        /// What went wrong
        message: String,
    },

    /// Storage backend failure.
    #[error("Storage error: {message}")]
    Store {
        /// Human-readable description, including backend codes when available
        message: String,
        /// Source error if available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience `Result` type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a not-found error.
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Error::NotFound(message.into())
    }

    /// Creates a forbidden error.
    pub fn forbidden<S: Into<String>>(message: S) -> Self {
        Error::Forbidden(message.into())
    }

    /// Creates an invalid-state error.
    pub fn invalid_state<S: Into<String>>(message: S) -> Self {
        Error::InvalidState(message.into())
    }

    /// Creates a new validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Error::Validation {
            field: None,
            message: message.into(),
        }
    }

    /// Creates a new validation error with a field name.
    pub fn validation_field<F, M>(field: F, message: M) -> Self
    where
        F: Into<String>,
        M: Into<String>,
    {
        Error::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Creates a storage error with a message.
    pub fn store<S: Into<String>>(message: S) -> Self {
        Error::Store {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a storage error with a message and source error.
    pub fn store_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Store {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns whether retrying the same operation could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Store { .. } => true,
            Error::NotFound(_)
            | Error::Forbidden(_)
            | Error::InvalidState(_)
            | Error::Validation { .. }
            | Error::Serialization(_) => false,
        }
    }
}
