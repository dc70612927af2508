// Liveness and readiness checks

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::auth::repository::CredentialStore;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

const HEALTHY: HealthStatus = HealthStatus { status: "Healthy" };
const UNHEALTHY: HealthStatus = HealthStatus { status: "Unhealthy" };

/// GET /health/live
/// Process is up; the store is not consulted
pub async fn live() -> Json<HealthStatus> {
    Json(HEALTHY)
}

/// GET /health/ready
pub async fn ready(State(store): State<Arc<dyn CredentialStore>>) -> (StatusCode, Json<HealthStatus>) {
    match store.ping().await {
        Ok(()) => (StatusCode::OK, Json(HEALTHY)),
        Err(e) => {
            tracing::error!("Readiness check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, Json(UNHEALTHY))
        }
    }
}
