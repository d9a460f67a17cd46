// Error types for the filter engine and conversions into HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

// Text typed into a numeric range input that cannot be read as a number
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a valid number")]
pub struct InvalidNumber(pub String);

// Failure of a single catalog query; never retried
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("catalog responded with status {0}")]
    Status(u16),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("invalid location '{0}'")]
    Invalid(String),
    #[error("'{0}' is not a catalog location")]
    NotCatalog(String),
    #[error("unknown model slug '{0}'")]
    UnknownModel(String),
}

#[derive(Debug, Error)]
pub enum PageError {
    #[error("invalid CSS selector '{0}'")]
    Selector(String),
    #[error("catalog page has no filter form")]
    MissingForm,
}

// The session actor has stopped (closed or torn down)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("filter session {0} is closed")]
pub struct SessionClosed(pub u64);

// Application error type returned by HTTP handlers
#[derive(Debug)]
pub enum AppError {
    InternalServerError(anyhow::Error),
    NotFound(String),
    BadRequest(String),
}

// Implement conversion from anyhow::Error for easier error propagation
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::InternalServerError(error)
    }
}

impl From<PageError> for AppError {
    fn from(error: PageError) -> Self {
        AppError::BadRequest(error.to_string())
    }
}

impl From<SessionClosed> for AppError {
    fn from(error: SessionClosed) -> Self {
        AppError::NotFound(error.to_string())
    }
}

// Implement IntoResponse for AppError to convert errors into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(e) => {
                // Log the detailed error here, don't expose it to the client
                tracing::error!("Internal server error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::NotFound(message) => {
                tracing::debug!("Not found: {}", message);
                (StatusCode::NOT_FOUND, message)
            }
            AppError::BadRequest(message) => {
                tracing::warn!("Rejected request: {}", message);
                (StatusCode::BAD_REQUEST, message)
            }
        };

        (status, error_message).into_response()
    }
}
