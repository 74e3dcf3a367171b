//! Liveness endpoint.

use crate::response::ApiResponse;
use axum::Json;
use serde::Serialize;

/// Health payload.
#[derive(Debug, Serialize)]
pub struct Health {
    /// Service name.
    pub service: &'static str,
    /// Crate version.
    pub version: &'static str,
}

/// `GET /health` — liveness probe.
pub async fn health() -> Json<ApiResponse<Health>> {
    Json(ApiResponse::ok(
        "ok",
        Health {
            service: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        },
    ))
}
