// Authentication and authorization error types

use crate::auth::repository::StoreError;
use crate::error::AppError;
use crate::validation::FieldErrors;

/// Failures raised by the auth service, token issuer and policy check
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("validation failed")]
    Validation(FieldErrors),

    /// Uniqueness rule violated (username, role name, user-role pair)
    #[error("{0}")]
    Conflict(String),

    /// Unknown username or wrong password; deliberately indistinguishable
    #[error("Username or password is incorrect.")]
    InvalidCredentials,

    /// Missing, malformed, tampered or expired bearer token
    #[error("Invalid token")]
    InvalidToken,

    /// Token lacks a claim the endpoint requires
    #[error("Insufficient permissions: role '{0}' required")]
    Forbidden(String),

    #[error("Object [{0}] is not found.")]
    NotFound(&'static str),

    #[error("Object [{object}] ({keys}) guid is not valid.")]
    InvalidGuid { object: &'static str, keys: String },

    #[error(transparent)]
    Store(StoreError),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Token generation error: {0}")]
    TokenGeneration(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            // A write raced past the service's own existence check
            StoreError::Duplicate(constraint) => {
                AuthError::Conflict(format!("Object already exists ({}).", constraint))
            }
            // The user or role was deleted between the check and the insert
            StoreError::MissingReference(constraint) => {
                AuthError::NotFound(if constraint.contains("role_id") { "Role" } else { "User" })
            }
            other => AuthError::Store(other),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(fields) => AppError::Validation(fields),
            AuthError::Conflict(message) => AppError::Api(message),
            AuthError::InvalidCredentials => AppError::Api(err.to_string()),
            AuthError::InvalidToken => AppError::Unauthorized(err.to_string()),
            AuthError::Forbidden(_) => AppError::Forbidden(err.to_string()),
            AuthError::NotFound(object) => AppError::NotFound(object.to_string()),
            AuthError::InvalidGuid { object, keys } => AppError::InvalidGuid {
                object: object.to_string(),
                keys,
            },
            AuthError::Store(StoreError::Unavailable(detail)) => AppError::StoreUnavailable(detail),
            AuthError::Store(StoreError::Mapping(detail)) => AppError::Mapping(detail),
            AuthError::Store(StoreError::Duplicate(constraint)) => {
                AppError::Api(format!("Object already exists ({}).", constraint))
            }
            AuthError::Store(missing @ StoreError::MissingReference(_)) => {
                AppError::from(AuthError::from(missing))
            }
            AuthError::PasswordHash(_) | AuthError::TokenGeneration(_) => {
                AppError::Unclassified(err.to_string())
            }
        }
    }
}
