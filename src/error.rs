use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed signing credentials. Fatal at startup, never
    /// retried.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A dashboard fetch was requested for a store id with no registered
    /// token. Raised before any network I/O.
    #[error("No registered store with id '{0}'")]
    UnknownStore(String),

    /// Transport error, timeout, or non-2xx status from a partner API
    /// endpoint. Not retried; aborts the whole orchestration.
    #[error("{endpoint} request failed: {source}")]
    RemoteCall {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// A record in an otherwise successful response had the wrong shape
    /// (non-numeric amount, negative stock, missing id). Surfaced instead
    /// of coerced to zero so upstream data corruption never hides inside
    /// the aggregates.
    #[error("{endpoint} returned a malformed record: {detail}")]
    InvalidRecord {
        endpoint: &'static str,
        detail: String,
    },

    /// The caller's cancellation signal fired while a fetch was in flight.
    #[error("Fetch cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::UnknownStore(_) => StatusCode::NOT_FOUND,
            AppError::RemoteCall { .. } | AppError::InvalidRecord { .. } => StatusCode::BAD_GATEWAY,
            AppError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_) | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
