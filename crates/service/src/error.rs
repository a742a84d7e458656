use curds_rows::RowError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by a database backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatabaseError {
    #[error("cannot connect to '{identifier}': {message}")]
    Connect { identifier: String, message: String },

    #[error("execute failed: {0}")]
    Execute(String),

    #[error("fetch failed: {0}")]
    Fetch(String),
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("No database provided")]
    Configuration,

    #[error("No such method: {0}")]
    MethodNotFound(String),

    #[error("missing required parameter '{0}'")]
    MissingParameter(&'static str),

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error(transparent)]
    Row(#[from] RowError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("cannot encode result: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ServiceError {
    /// Error-kind name written to `error.type`.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Configuration => "ConfigurationError",
            ServiceError::MethodNotFound(_) => "MethodNotFoundError",
            ServiceError::MissingParameter(_) => "MissingParameterError",
            ServiceError::InvalidParameter { .. } => "InvalidParameterError",
            ServiceError::Row(e) => e.kind(),
            ServiceError::Database(_) => "DatabaseError",
            ServiceError::Serialization(_) => "SerializationError",
        }
    }

    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ServiceError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// `{"message": ..., "type": ...}` as placed under a reply's `error` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: kind.into(),
        }
    }
}

impl From<&ServiceError> for ErrorEnvelope {
    fn from(e: &ServiceError) -> Self {
        Self::new(e.to_string(), e.kind())
    }
}
