use crate::errors::ApiError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use validator::Validate;

fn json_with<T: Serialize>(status: StatusCode, body: T) -> Response {
    (status, Json(body)).into_response()
}

pub fn success_response<T: Serialize>(body: T) -> Response {
    json_with(StatusCode::OK, body)
}

pub fn created_response<T: Serialize>(body: T) -> Response {
    json_with(StatusCode::CREATED, body)
}

pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Runs the payload's `validator` rules; failures become a 400.
pub fn validate_input<T: Validate>(payload: &T) -> Result<(), ApiError> {
    payload
        .validate()
        .map_err(|errors| ApiError::Invalid(format!("Invalid payload: {errors}")))
}
