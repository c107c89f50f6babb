use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::ValidationError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Invalid timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Internal server error")]
    Internal(String),
}

impl Error {
    pub fn not_found(what: impl std::fmt::Display, id: impl std::fmt::Display) -> Self {
        Error::NotFound(format!("{} {}", what, id))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Error::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            Error::Io(e) => {
                tracing::error!("IO error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "IO error".to_string())
            }
            Error::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Serialization error".to_string())
            }
            Error::Config(e) => {
                tracing::error!("Configuration error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Configuration error".to_string())
            }
            Error::Template(e) => {
                tracing::error!("Template error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error".to_string())
            }
            Error::Timestamp(e) => (StatusCode::BAD_REQUEST, format!("Invalid timestamp: {}", e)),
            Error::Validation(e) => {
                tracing::warn!(field = e.field(), "Validation failed: {}", e);
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            Error::NotFound(_) | Error::UnknownUser(_) => (StatusCode::NOT_FOUND, self.to_string()),
            Error::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Error::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
