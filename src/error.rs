use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::model::InferenceError;

/// Request-level errors with HTTP status code mapping. Processing details
/// stay in the server log; clients only see the fixed messages.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Model not available")]
    ModelUnavailable,
    #[error("{0}")]
    BadInput(String),
    #[error("Predicted class index out of range.")]
    ClassOutOfRange { index: usize, classes: usize },
    #[error("Prediction failed. Check server logs.")]
    Processing(#[from] InferenceError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Processing(source) => error!("Error during prediction: {}", source),
            ApiError::ClassOutOfRange { index, classes } => {
                error!("Predicted index {} outside label range {}", index, classes)
            }
            _ => {}
        }

        let status = match self {
            ApiError::BadInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
