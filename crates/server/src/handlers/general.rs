//! # General Route Handlers
//!
//! The root and health check endpoints of the `valorie-server`.

use crate::types::HealthResponse;
use axum::Json;

fn health() -> HealthResponse {
    HealthResponse {
        status: "healthy".to_string(),
        message: "Backend is running!".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// The handler for the root (`/`) endpoint.
pub async fn root() -> Json<HealthResponse> {
    Json(health())
}

/// The handler for the health check (`/health`) endpoint.
pub async fn health_check() -> Json<HealthResponse> {
    Json(health())
}
