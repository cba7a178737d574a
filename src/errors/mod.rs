use std::io;
use axum::{http::StatusCode, response::{IntoResponse, Response}};
use thiserror::Error;

/// Custom error types for the wiki application
#[derive(Debug, Error)]
pub enum WikiError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The file does not start with a front matter block. Not a failure
    /// for callers that treat metadata as optional.
    #[error("metadata not found")]
    MetadataNotFound,

    #[error("tag `{0}` already exists")]
    TagAlreadyExists(String),

    #[error("tag `{0}` not found")]
    TagNotFound(String),

    #[error("not found")]
    NotFound,

    #[error("invalid path")]
    InvalidPath,

    #[error("render error: {0}")]
    RenderError(String),

    #[error("history error: {0}")]
    HistoryError(String),

    #[error("template error: {0}")]
    TemplateError(String),
}

impl IntoResponse for WikiError {
    fn into_response(self) -> Response {
        match self {
            WikiError::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
            WikiError::InvalidPath => (StatusCode::BAD_REQUEST, "Invalid path").into_response(),
            // Details stay in the log; clients only ever see the generic text.
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response(),
        }
    }
}
