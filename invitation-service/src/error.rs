use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use eventhub_shared::{error::ServiceError, models::ErrorResponse};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// HTTP-facing wrapper around the shared service error
#[derive(Debug, Error)]
#[error(transparent)]
pub struct AppError(#[from] pub ServiceError);

// Error handler for our API
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            ServiceError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ServiceError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            ServiceError::DispatchUnavailable(msg) => {
                tracing::error!("Mail transport unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Mail delivery became unavailable; the batch was aborted".to_string(),
                )
            }
            ServiceError::ConfigError(msg) | ServiceError::InternalError(msg) => {
                tracing::error!("Internal server error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        // Build the error response
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
