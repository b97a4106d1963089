use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::ToSchema;
use validator::ValidationErrors;

use gluco_screen_domain::errors::ScreeningError;

/// Error response format for the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn validation_error(message: &str, details: Option<serde_json::Value>) -> Self {
        Self {
            details,
            ..Self::new("validation_error", message)
        }
    }

    /// Registration with an email that already has an identity
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("conflict", message)
    }

    pub fn internal_error() -> Self {
        Self::new("internal_error", "An unexpected error occurred")
    }

    pub fn status(&self) -> StatusCode {
        match self.error.as_str() {
            "validation_error" | "bad_request" => StatusCode::BAD_REQUEST,
            "auth_error" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "not_found" => StatusCode::NOT_FOUND,
            "conflict" => StatusCode::CONFLICT,
            "model_unavailable" | "persistence_error" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ScreeningError> for ErrorResponse {
    fn from(err: ScreeningError) -> Self {
        match &err {
            ScreeningError::PersistenceError(_) | ScreeningError::ModelUnavailableError(_) => {
                error!("Request failed: {}", err)
            }
            _ => warn!("Request rejected: {}", err),
        }
        Self::new(err.code(), err.message())
    }
}

impl From<ValidationErrors> for ErrorResponse {
    fn from(errors: ValidationErrors) -> Self {
        warn!("Invalid request body: {}", errors);
        let details = serde_json::to_value(errors.field_errors()).ok();
        Self::validation_error("Request validation failed", details)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_status() {
        let cases = [
            (ScreeningError::ValidationError("x".into()), StatusCode::BAD_REQUEST),
            (ScreeningError::AuthError("x".into()), StatusCode::UNAUTHORIZED),
            (ScreeningError::AuthorizationError("x".into()), StatusCode::FORBIDDEN),
            (ScreeningError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ScreeningError::PersistenceError("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (ScreeningError::ModelUnavailableError("x".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (err, status) in cases {
            assert_eq!(ErrorResponse::from(err).status(), status);
        }
        assert_eq!(ErrorResponse::conflict("taken").status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_message_has_no_kind_prefix() {
        let response = ErrorResponse::from(ScreeningError::NotFound("no such user".into()));
        assert_eq!(response.error, "not_found");
        assert_eq!(response.message, "no such user");
    }
}
