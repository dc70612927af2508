// Tracing setup and request/response logging middleware

use std::time::Instant;

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::AppError;
use crate::validation::FieldErrors;

/// Logged bodies are cut off after this many bytes
const MAX_LOGGED_BODY_BYTES: usize = 2048;

/// Largest body the logger will buffer, matching axum's `DefaultBodyLimit`
pub const MAX_BUFFERED_BODY_BYTES: usize = 2 * 1024 * 1024;

const REDACTED: &str = "[redacted]";

/// Responses whose `data` is a bearer token
const TOKEN_RESPONSE_PATHS: [&str; 2] = ["/api/auth/login", "/api/auth/renew"];

/// Initialize the tracing subscriber
///
/// `RUST_LOG` selects the level; `info` when unset.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .init();
}

/// Render a body for the log, truncated and lossily decoded
fn body_for_log(bytes: &[u8]) -> String {
    if bytes.len() <= MAX_LOGGED_BODY_BYTES {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    format!(
        "{}... ({} bytes truncated)",
        String::from_utf8_lossy(&bytes[..MAX_LOGGED_BODY_BYTES]),
        bytes.len() - MAX_LOGGED_BODY_BYTES
    )
}

/// Replace every `password` member, at any depth and in any letter case
fn mask_password_fields(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if key.eq_ignore_ascii_case("password") {
                    *field = Value::String(REDACTED.to_string());
                } else {
                    mask_password_fields(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(mask_password_fields),
        _ => {}
    }
}

/// Request body for the log with credentials masked
///
/// A body that is not valid JSON but mentions a password is dropped whole.
fn request_body_for_log(bytes: &Bytes) -> String {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(mut value) => {
            mask_password_fields(&mut value);
            body_for_log(value.to_string().as_bytes())
        }
        Err(_) if String::from_utf8_lossy(bytes).to_ascii_lowercase().contains("password") => {
            REDACTED.to_string()
        }
        Err(_) => body_for_log(bytes),
    }
}

/// Response body for the log with issued tokens masked
fn response_body_for_log(path: &str, bytes: &Bytes) -> String {
    if !TOKEN_RESPONSE_PATHS.contains(&path) {
        return body_for_log(bytes);
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(mut envelope) => {
            if let Some(data) = envelope.get_mut("data").filter(|data| !data.is_null()) {
                *data = Value::String(REDACTED.to_string());
            }
            body_for_log(envelope.to_string().as_bytes())
        }
        Err(_) => REDACTED.to_string(),
    }
}

/// Header list with the bearer credential masked
fn headers_for_log(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            if name == header::AUTHORIZATION {
                format!("{}: {}", name, REDACTED)
            } else {
                format!("{}: {}", name, value.to_str().unwrap_or("[binary]"))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Outermost middleware recording each request and its response
///
/// Bodies up to `MAX_BUFFERED_BODY_BYTES` are buffered for logging and
/// handed on unchanged; larger requests are refused as validation failures.
pub async fn request_logger(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let (parts, body) = request.into_parts();

    let request_bytes = match to_bytes(body, MAX_BUFFERED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to read request body: {}", e);
            return AppError::Validation(FieldErrors::single(
                "body",
                format!("Request body could not be read within {} bytes", MAX_BUFFERED_BODY_BYTES),
            ))
            .into_response();
        }
    };

    let method = parts.method.clone();
    let route = parts.uri.path().to_string();
    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| route.clone());

    info!(
        "HTTP Request: scheme={} method={} path={} headers=[{}] body={}",
        parts.uri.scheme_str().unwrap_or("http"),
        method,
        path,
        headers_for_log(&parts.headers),
        request_body_for_log(&request_bytes)
    );

    let response = next
        .run(Request::from_parts(parts, Body::from(request_bytes)))
        .await;

    let (parts, body) = response.into_parts();
    let response_bytes = match to_bytes(body, MAX_BUFFERED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to read response body: {}", e);
            return AppError::Unclassified(e.to_string()).into_response();
        }
    };

    info!(
        "HTTP Response: method={} path={} status={} elapsed_ms={} body={}",
        method,
        path,
        parts.status.as_u16(),
        started.elapsed().as_millis(),
        response_body_for_log(&route, &response_bytes)
    );

    Response::from_parts(parts, Body::from(response_bytes))
}
