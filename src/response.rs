//! Uniform API envelope and error-to-HTTP mapping.
//!
//! Every response — success or failure — uses the same JSON shape:
//! `{success, message, data?, error?}`. Domain errors carry a stable error
//! code; server errors surface a message but log the detail.

use crate::error::BookingError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Uniform response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded.
    pub success: bool,
    /// Human-readable message.
    pub message: String,
    /// Payload, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Stable error code, present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful envelope with a payload.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    /// Successful envelope without a payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            error: None,
        }
    }
}

/// Error wrapper implementing Axum's `IntoResponse` with the envelope.
#[derive(Debug)]
pub struct ApiError(pub BookingError);

impl ApiError {
    const fn status(&self) -> StatusCode {
        match &self.0 {
            BookingError::TripNotFound
            | BookingError::DepartureNotFound
            | BookingError::BookingNotFound => StatusCode::NOT_FOUND,
            BookingError::TooManyAttempts { .. } => StatusCode::TOO_MANY_REQUESTS,
            BookingError::Database(_) | BookingError::Email(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(error: BookingError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(
                code = self.0.code(),
                error = %self.0,
                "request failed with server error"
            );
        }

        // Server-side detail stays in the logs; the client gets a generic
        // message.
        let message = if status.is_server_error() {
            "An internal error occurred".to_string()
        } else {
            self.0.to_string()
        };

        let body = ApiResponse::<()> {
            success: false,
            message,
            data: None,
            error: Some(self.0.code().to_string()),
        };

        (status, Json(body)).into_response()
    }
}
