use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::app_state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// `available` when a model binding is configured.
    pub ai_backend: String,
    pub model: Option<String>,
}

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "health",
    responses(
        (status = 200, description = "Health check successful", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let model = state.pipeline.model().map(str::to_string);
    let ai_backend = if model.is_some() { "available" } else { "unavailable" };
    info!(ai_backend, "Health check passed");

    Json(HealthResponse {
        status: "OK".to_string(),
        ai_backend: ai_backend.to_string(),
        model,
    })
}
