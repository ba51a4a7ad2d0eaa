use crate::access::DenyReason;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: DenyReason },

    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TriageError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn complaint_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: "complaint",
            id: id.to_string(),
        }
    }

    /// Stable snake_case name used on the JSON wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::NotFound { .. } => "not_found",
            Self::Forbidden { .. } => "forbidden",
            Self::ClassifierUnavailable(_) => "classifier_unavailable",
            Self::Storage(_) => "storage_error",
            Self::Serialization(_) => "serialization_error",
            Self::Config(_) => "config_error",
            Self::Other(_) => "internal_error",
        }
    }
}

pub type TriageResult<T> = Result<T, TriageError>;
