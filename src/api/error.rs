use actix_web::{http::header, http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

use crate::domain::order::OrderError;

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] OrderError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Too many requests, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Domain(error) => match error {
                OrderError::OrderNotFound(_) | OrderError::PancakeNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                OrderError::Validation { .. }
                | OrderError::InvalidTransition { .. }
                | OrderError::InvalidState { .. } => StatusCode::BAD_REQUEST,
                OrderError::ConcurrencyExhausted { .. } => StatusCode::CONFLICT,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        if let ApiError::RateLimited { retry_after_secs } = self {
            response.insert_header((header::RETRY_AFTER, retry_after_secs.to_string()));
        }
        response.json(ErrorResponse {
            error: self.to_string(),
        })
    }
}
