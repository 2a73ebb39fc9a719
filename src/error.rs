use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// The record kinds served by the API, used to build not-found messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Building,
    Location,
    Request,
    User,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Building => write!(f, "Building"),
            Resource::Location => write!(f, "Location"),
            Resource::Request => write!(f, "Request"),
            Resource::User => write!(f, "User"),
        }
    }
}

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Name of the offending field (`body`/`query` when the whole input is malformed).
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Application-wide error types.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(Resource),

    #[error("Validation failed: {0:?}")]
    Validation(Vec<ValidationIssue>),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a validation failure on a single field.
    pub fn invalid(path: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(vec![ValidationIssue::new(path, message)])
    }
}

/// Helper conversion from anyhow::Error
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
