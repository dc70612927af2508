// Error handling module for the auth API
// Single place where failure kinds are translated into the response envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{error, warn};

use crate::response::ServiceResponse;
use crate::validation::FieldErrors;

const DEFAULT_ERROR_MESSAGE: &str = "Server's unexpected error. Please contact Administrator.";
const VALIDATION_MESSAGE: &str = "Request body are invalid";
const MISSING_ARGUMENT_MESSAGE: &str = "Missing required parameter.";

/// Stable numeric application codes carried in the envelope's `code` field
pub mod codes {
    pub const BAD_REQUEST: u16 = 400;
    pub const UNAUTHORIZED: u16 = 401;
    pub const FORBIDDEN: u16 = 403;
    pub const NETWORK: u16 = 500;
    pub const STORE_UNAVAILABLE: u16 = 503;
    pub const API_ERROR: u16 = 801;
    pub const INVALID_DATE: u16 = 802;
    pub const INVALID_GUID: u16 = 803;
    pub const NOT_FOUND: u16 = 804;
    pub const NULL_VALUE: u16 = 805;
    pub const UNCLASSIFIED: u16 = 900;
}

/// Every failure kind the API can report
///
/// Handlers return `Result<_, AppError>`; translation to a status code and
/// envelope happens only in `IntoResponse`. Domain failures answer HTTP 200
/// with `isSuccess = false`; only infrastructure and bearer failures use a
/// non-200 status.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Credential store could not be reached
    #[error("credential store unavailable: {0}")]
    StoreUnavailable(String),

    /// Outbound HTTP call failed
    #[error("network error: {0}")]
    Network(String),

    /// A required argument was not supplied
    #[error("missing required argument: {0}")]
    MissingArgument(String),

    /// Request body or field-level validation failed
    #[error("validation failed")]
    Validation(FieldErrors),

    /// Stored data could not be translated into the domain model
    #[error("mapping failure: {0}")]
    Mapping(String),

    /// Generic domain error (conflicts, bad credentials)
    #[error("{0}")]
    Api(String),

    #[error("Object [{object}] ({keys}) date is not valid.")]
    InvalidDate { object: String, keys: String },

    #[error("Object [{object}] ({keys}) guid is not valid.")]
    InvalidGuid { object: String, keys: String },

    #[error("Object [{0}] is not found.")]
    NotFound(String),

    #[error("This object [{0}] value is null.")]
    Null(String),

    /// Bearer token missing, malformed, tampered or expired
    #[error("{0}")]
    Unauthorized(String),

    /// Valid bearer lacking the claim an endpoint requires
    #[error("{0}")]
    Forbidden(String),

    /// Anything not covered above
    #[error("unclassified error: {0}")]
    Unclassified(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, envelope) = self.to_envelope();
        (status, Json(envelope)).into_response()
    }
}

impl AppError {
    /// Convert the error into an HTTP status and failure envelope, logging it
    /// with a severity that reflects its kind
    pub fn to_envelope(&self) -> (StatusCode, ServiceResponse<()>) {
        let status = self.status_code();
        let code = self.app_code();

        let envelope = match self {
            AppError::StoreUnavailable(detail) => {
                error!(code, "Could not connect to credential store: {}", detail);
                ServiceResponse::failure(DEFAULT_ERROR_MESSAGE, code, None)
            }
            AppError::Network(detail) => {
                error!(code, "Network error: {}", detail);
                ServiceResponse::failure(DEFAULT_ERROR_MESSAGE, code, None)
            }
            AppError::Mapping(detail) => {
                error!(code, "Invalid mapping: {}", detail);
                ServiceResponse::failure(DEFAULT_ERROR_MESSAGE, code, None)
            }
            AppError::MissingArgument(name) => {
                warn!(code, "Missing required parameter: {}", name);
                ServiceResponse::failure(
                    MISSING_ARGUMENT_MESSAGE,
                    code,
                    Some(serde_json::Value::String(name.clone())),
                )
            }
            AppError::Validation(fields) => {
                warn!(code, "Bad request, body is invalid: {:?}", fields);
                ServiceResponse::failure(VALIDATION_MESSAGE, code, serde_json::to_value(fields).ok())
            }
            AppError::Unclassified(detail) => {
                warn!(code, "Unclassified error: {}", detail);
                ServiceResponse::failure("Unknown Error", code, None)
            }
            domain => {
                let message = domain.to_string();
                warn!(code, "Return error response: {}", message);
                ServiceResponse::failure(message, code, None)
            }
        };

        (status, envelope)
    }

    /// Application code placed in the envelope for this failure kind
    pub fn app_code(&self) -> u16 {
        match self {
            AppError::StoreUnavailable(_) => codes::STORE_UNAVAILABLE,
            AppError::Network(_) => codes::NETWORK,
            AppError::MissingArgument(_) | AppError::Validation(_) | AppError::Mapping(_) => {
                codes::BAD_REQUEST
            }
            AppError::Api(_) => codes::API_ERROR,
            AppError::InvalidDate { .. } => codes::INVALID_DATE,
            AppError::InvalidGuid { .. } => codes::INVALID_GUID,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Null(_) => codes::NULL_VALUE,
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::Forbidden(_) => codes::FORBIDDEN,
            AppError::Unclassified(_) => codes::UNCLASSIFIED,
        }
    }

    /// HTTP status used for this failure kind
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Network(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::OK,
        }
    }
}
