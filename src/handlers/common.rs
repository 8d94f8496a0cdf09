use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use validator::Validate;

use crate::errors::{ApiError, ServiceError};

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|e| ApiError::ValidationError(format!("Validation failed: {}", e)))
}

/// Map service errors to API errors
pub fn map_service_error(err: ServiceError) -> ApiError {
    ApiError::ServiceError(err)
}

/// Envelope returned by every advanced listing endpoint.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(total: u64, limit: u64, offset: u64, items: Vec<T>) -> Self {
        Self {
            total,
            limit,
            offset,
            items,
        }
    }
}

pub(crate) fn default_limit() -> u64 {
    50
}

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_asc() -> String {
    "asc".to_string()
}

pub(crate) fn default_desc() -> String {
    "desc".to_string()
}
