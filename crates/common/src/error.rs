//! Error types for carmeet.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // === Server Errors ===
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The relationship row changed but its counter could not be written.
    ///
    /// The counter no longer matches the relationship rows until it is reconciled.
    #[error("Counter update failed for {target_id}: {message}")]
    CounterUpdateFailed { target_id: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Self::InvalidOperation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,

            // 5xx Server Errors
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::CounterUpdateFailed { .. } | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::InvalidOperation(_) => "INVALID_OPERATION",
            Self::NotFound(_) => "NOT_FOUND",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::CounterUpdateFailed { .. } => "COUNTER_UPDATE_FAILED",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = Json(json!({
            "success": false,
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_counter_update_failed_is_distinct() {
        let err = AppError::CounterUpdateFailed {
            target_id: "car1".to_string(),
            message: "connection reset".to_string(),
        };

        assert_eq!(err.error_code(), "COUNTER_UPDATE_FAILED");
        assert!(err.is_server_error());
        assert!(err.to_string().contains("car1"));
    }

    #[test]
    fn test_client_errors_are_not_server_errors() {
        assert!(!AppError::Unauthenticated.is_server_error());
        assert!(!AppError::InvalidArgument("x".into()).is_server_error());
        assert!(!AppError::InvalidOperation("x".into()).is_server_error());
        assert_eq!(
            AppError::StoreUnavailable("down".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_response_body_is_structured_failure() {
        let response = AppError::InvalidOperation("Cannot follow yourself".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "INVALID_OPERATION");
        assert_eq!(
            body["error"]["message"],
            "Invalid operation: Cannot follow yourself"
        );
    }
}
