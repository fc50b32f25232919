//! Liveness and readiness

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: i64,
    pub storage: &'static str,
    pub generator: &'static str,
    pub connections: usize,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub storage: ComponentStatus,
}

#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub name: &'static str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Returns 200 while the process is up; does not touch storage
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().timestamp_millis(),
        storage: state.store.backend(),
        generator: state.agents.generator_name(),
        connections: state.hub.connection_count(),
    })
}

/// 200 when storage answers, 503 otherwise
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let name = state.store.backend();
    let (code, status, storage) = match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            "ready",
            ComponentStatus {
                name,
                status: "healthy",
                error: None,
            },
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "not_ready",
            ComponentStatus {
                name,
                status: "unhealthy",
                error: Some(e.to_string()),
            },
        ),
    };
    (code, Json(ReadinessResponse { status, storage }))
}
