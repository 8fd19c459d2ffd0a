//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use domain_billing::BillingError;

use crate::auth::AuthError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The data store failed in a way that may clear up on retry
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The data store answered with something unusable
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (error_type, message) = match &self {
            ApiError::NotFound(msg) => ("not_found", msg.clone()),
            ApiError::BadRequest(msg) => ("bad_request", msg.clone()),
            ApiError::Unauthorized => ("unauthorized", "Unauthorized".to_string()),
            ApiError::Forbidden(msg) => ("forbidden", msg.clone()),
            ApiError::ServiceUnavailable(msg) => ("service_unavailable", msg.clone()),
            ApiError::BadGateway(msg) => ("bad_gateway", msg.clone()),
            ApiError::Internal(msg) => ("internal_error", msg.clone()),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details: None,
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::InvalidDateRange(e) => ApiError::BadRequest(e.to_string()),
            BillingError::StudentNotFound(id) => ApiError::NotFound(format!("Student {} not found", id)),
            BillingError::DataStore(e) if e.is_transient() => {
                error!(error = %e, "Data store unavailable");
                ApiError::ServiceUnavailable("Data store unavailable".to_string())
            }
            BillingError::DataStore(e) => {
                error!(error = %e, "Data store failure");
                ApiError::BadGateway("Data store failure".to_string())
            }
            BillingError::InvalidRecord(msg) => {
                error!(%msg, "Invalid billing record");
                ApiError::Internal("Invalid billing record".to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken | AuthError::TokenExpired => ApiError::Unauthorized,
            AuthError::MissingPermission(permission) => {
                ApiError::Forbidden(format!("Missing permission: {}", permission))
            }
        }
    }
}
