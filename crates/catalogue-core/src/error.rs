//! Error types for the catalogue engines

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("not found: {kind} {id}")]
    NotFound { kind: String, id: String },

    #[error("already exists: {kind} {id} in catalogue {catalogue_id}")]
    AlreadyExists {
        kind: String,
        id: String,
        catalogue_id: String,
    },

    #[error("validation failed for {kind}: {}", reasons.join("; "))]
    ValidationFailed { kind: String, reasons: Vec<String> },

    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("concurrent modification of {kind} {id}")]
    Conflict { kind: String, id: String },

    #[error("deadline exceeded after {millis}ms: {operation}")]
    Timeout { operation: String, millis: u64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("registry error: {0}")]
    Registry(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn already_exists(
        kind: impl Into<String>,
        id: impl Into<String>,
        catalogue_id: impl Into<String>,
    ) -> Self {
        Self::AlreadyExists {
            kind: kind.into(),
            id: id.into(),
            catalogue_id: catalogue_id.into(),
        }
    }

    pub fn validation(kind: impl Into<String>, reasons: Vec<String>) -> Self {
        Self::ValidationFailed {
            kind: kind.into(),
            reasons,
        }
    }

    pub fn conflict(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Conflict {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
