use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors for the event membership and lifecycle operations.
///
/// Every user-visible variant carries a human-readable reason; record-store
/// and infrastructure failures render as a generic 500 so raw driver errors
/// never reach the client.
#[derive(Error, Debug)]
pub enum EventError {
    #[error("Event not found")]
    NotFound,

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Not authorized to modify this event")]
    NotAuthorized,

    #[error("You have already RSVPd for this event")]
    AlreadyMember,

    #[error("Event is fully booked")]
    CapacityExceeded,

    #[error("Please upload an image")]
    MissingAsset,

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl EventError {
    fn status(&self) -> StatusCode {
        match self {
            EventError::NotFound => StatusCode::NOT_FOUND,
            EventError::Unauthenticated | EventError::NotAuthorized => StatusCode::UNAUTHORIZED,
            EventError::AlreadyMember
            | EventError::CapacityExceeded
            | EventError::MissingAsset
            | EventError::Validation(_) => StatusCode::BAD_REQUEST,
            EventError::Database(_) | EventError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for EventError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
