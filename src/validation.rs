// Validation utilities module
// Custom validation rules and the request-body validation filter

use std::borrow::Cow;
use std::collections::BTreeMap;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::AppError;

/// Field-level validation messages keyed by field name
///
/// Serialized as `{"field": ["message", ...]}` inside the envelope's
/// `exceptionMessage`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// A single message for a single field
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    #[cfg(test)]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

impl From<&ValidationErrors> for FieldErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let mut fields = FieldErrors::default();
        for (field, failures) in errors.field_errors() {
            for failure in failures {
                let message = failure
                    .message
                    .clone()
                    .unwrap_or_else(|| Cow::Owned(format!("{} is invalid ({})", field, failure.code)));
                fields.push(camel_case(field), message.into_owned());
            }
        }
        fields
    }
}

/// Field names are reported the way they appear on the wire (`role_name` -> `roleName`)
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Validates that a value starts with an uppercase letter
/// Used for role names ("Admin" is accepted, "admin" is not)
pub fn validate_first_letter_uppercase(value: &str) -> Result<(), ValidationError> {
    match value.chars().next() {
        Some(first) if first.is_uppercase() => Ok(()),
        _ => {
            let mut error = ValidationError::new("first_letter_uppercase");
            error.message = Some(Cow::Borrowed("First letter must be uppercase"));
            Err(error)
        }
    }
}

/// JSON body extractor that runs model validation before the handler
///
/// Malformed bodies and failed `Validate` rules short-circuit with the
/// validation envelope; the handler never runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(FieldErrors::single("body", rejection.body_text())))?;

        value
            .validate()
            .map_err(|errors| AppError::Validation(FieldErrors::from(&errors)))?;

        Ok(Self(value))
    }
}
