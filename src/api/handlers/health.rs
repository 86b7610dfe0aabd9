use crate::AppState;
use crate::api::error::ErrorKind;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

const PROBE_KEY: &str = "health-check";

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    // A missing probe object still proves the backend answered.
    let storage_status = match state.storage.stat(PROBE_KEY).await {
        Ok(_) => "connected",
        Err(e) if e.kind() == ErrorKind::NotFound => "connected",
        Err(e) => {
            tracing::warn!("Storage health probe failed: {:?}", e);
            "disconnected"
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        storage: storage_status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
