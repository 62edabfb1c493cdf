use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared::{ErrorResponse, UPLOAD_TOO_LARGE};

use crate::predictor::PredictError;
use crate::storage::upload_store::StorageError;
use crate::validation::ValidationError;

/// Every way a prediction request can end without a prediction.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),
    #[error("Prediction failed: {0}")]
    Prediction(#[from] PredictError),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::FileTooLarge => ValidationError::TooLarge(UPLOAD_TOO_LARGE).into(),
            StorageError::InvalidFormat => ValidationError::NoImageFile.into(),
            StorageError::Io(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl ApiError {
    pub fn client_error(&self) -> ErrorResponse {
        match self {
            ApiError::MethodNotAllowed => ErrorResponse::new("Method not allowed"),
            ApiError::Validation(err) => ErrorResponse {
                error: err.to_string(),
                details: err.details(),
            },
            ApiError::Prediction(err @ PredictError::Timeout(_)) => {
                ErrorResponse::with_details("Prediction timed out", err.details())
            }
            ApiError::Prediction(err) => {
                ErrorResponse::with_details("Prediction failed", err.details())
            }
            ApiError::Internal(details) => {
                ErrorResponse::with_details("Internal server error", details.clone())
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Prediction(PredictError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Prediction(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("{}", self);
        } else {
            log::warn!("{}", self);
        }
        HttpResponse::build(self.status_code()).json(self.client_error())
    }
}
