use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{dragon::DragonError, openrouter::OpenRouterError, router::RouterError};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The model provider could not be reached or answered with an error.
    #[error("model provider failure: {0}")]
    Upstream(String),
    /// No free model is currently available to route to.
    #[error("no free experts available")]
    NoExperts,
    /// Router checkpoint storage failed.
    #[error("router state unavailable: {0}")]
    RouterState(String),
}

impl From<DragonError> for ServiceError {
    fn from(err: DragonError) -> Self {
        match err {
            DragonError::Provider(source) => source.into(),
        }
    }
}

impl From<OpenRouterError> for ServiceError {
    fn from(err: OpenRouterError) -> Self {
        ServiceError::Upstream(err.to_string())
    }
}

impl From<RouterError> for ServiceError {
    fn from(err: RouterError) -> Self {
        match err {
            RouterError::NoExperts => ServiceError::NoExperts,
            other => ServiceError::RouterState(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// An upstream dependency failed.
    #[error("bad gateway: {0}")]
    BadGateway(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Upstream(message) => AppError::BadGateway(message),
            ServiceError::NoExperts => {
                AppError::ServiceUnavailable("no free experts available".into())
            }
            ServiceError::RouterState(message) => AppError::Internal(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
