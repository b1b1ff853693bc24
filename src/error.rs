use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error during {operation}: {source}")]
    Storage {
        operation: String,
        #[source]
        source: BoxError,
    },

    #[error("Recipe generation failed: {0}")]
    Generation(String),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap a backend failure with the store operation that produced it
    pub fn storage(operation: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::Storage {
            operation: operation.into(),
            source: source.into(),
        }
    }

    /// Get a sanitized error message safe for logging
    /// Filters out potentially sensitive information
    pub fn log_safe(&self) -> String {
        match self {
            // Backend errors might contain schema details or connection strings
            Error::Storage { operation, .. } => format!("Storage operation failed: {operation}"),
            Error::Migration(_) => "Database migration failed".to_string(),

            // HTTP errors might contain internal URLs
            Error::Http(_) => "External HTTP request failed".to_string(),

            Error::Internal(msg) => {
                let lower = msg.to_lowercase();
                if lower.contains("password")
                    || lower.contains("secret")
                    || lower.contains("token")
                    || lower.contains("key")
                {
                    "Internal error (details redacted)".to_string()
                } else {
                    format!("Internal error: {msg}")
                }
            }

            Error::InvalidInput(msg) => format!("Invalid input: {msg}"),
            Error::NotFound(msg) => format!("Not found: {msg}"),
            Error::Generation(msg) => format!("Recipe generation failed: {msg}"),
            Error::Io(_) => "File system operation failed".to_string(),
            Error::Config(msg) => format!("Configuration error: {msg}"),
        }
    }

    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Generation(_) | Error::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Attach a store operation name to a `sqlx` result
pub trait StorageContext<T> {
    fn storage(self, operation: &str) -> Result<T>;
}

impl<T> StorageContext<T> for std::result::Result<T, sqlx::Error> {
    fn storage(self, operation: &str) -> Result<T> {
        self.map_err(|e| Error::storage(operation, e))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::error!("Request error: {}", self.log_safe());

        let status = self.status_code();
        let error_message = match &self {
            Error::InvalidInput(msg) | Error::NotFound(msg) => msg.clone(),
            Error::Storage { .. } => "Storage error".to_string(),
            Error::Generation(_) | Error::Http(_) => "Recipe generation failed".to_string(),
            _ => "Internal server error".to_string(),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
