use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use skybound_booking::BookingError;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Rejected(msg) => AppError::ValidationError(msg),
            BookingError::NotFound(_) => AppError::NotFoundError(err.to_string()),
            BookingError::AlreadyCancelled => AppError::ValidationError(err.to_string()),
            BookingError::FlightNotFound(_) | BookingError::PaymentNotFound(_) => {
                AppError::NotFoundError(err.to_string())
            }
            BookingError::Server(msg) => AppError::InternalServerError(msg),
        }
    }
}
