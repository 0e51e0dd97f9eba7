//! API error responses in the provider's error envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::model::ErrorDetail;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Access denied")]
    Unauthorized,

    #[error("Too many requests")]
    RateLimited,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Resource not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    errors: Vec<ErrorDetail>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Provider error code.
    pub fn code(&self) -> i32 {
        match self {
            ApiError::Unauthorized => 1005,
            ApiError::RateLimited => 1015,
            ApiError::InvalidParameter(_) => 1008,
            ApiError::NotFound(_) => 1006,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "Access denied",
            ApiError::RateLimited => "Too many requests",
            ApiError::InvalidParameter(_) => "Parameter value is not valid",
            ApiError::NotFound(_) => "Resource not found",
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ApiError::InvalidParameter(details) | ApiError::NotFound(details) => {
                Some(details.clone())
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope {
            errors: vec![ErrorDetail {
                code: self.code(),
                title: self.title().to_string(),
                details: self.details(),
            }],
        };

        (self.status(), Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
