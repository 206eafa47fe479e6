use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(anyhow::Error),

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(anyhow::anyhow!(message.into()))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(anyhow::anyhow!(message.into()))
    }

    /// Re-classify store and internal failures as client errors.
    ///
    /// The write paths (create, update) report every failure as 400, so
    /// handlers funnel their errors through here before responding.
    pub fn into_client_error(self) -> Self {
        match self {
            AppError::DatabaseError(err) | AppError::InternalError(err) => {
                AppError::BadRequest(err)
            }
            other => other,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InternalError(_) | AppError::DatabaseError(_) | AppError::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Human-readable message without the variant prefix.
    pub fn message(&self) -> String {
        match self {
            AppError::BadRequest(err)
            | AppError::NotFound(err)
            | AppError::InternalError(err)
            | AppError::ServiceUnavailable(err)
            | AppError::DatabaseError(err) => err.to_string(),
            AppError::ConfigError(err) => format!("Configuration error: {}", err),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!(status = %status.as_u16(), error = %message, "Request failed");
        } else {
            tracing::debug!(status = %status.as_u16(), error = %message, "Request rejected");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
