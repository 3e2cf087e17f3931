//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Configured AI provider, or `none` when only the local pipeline runs.
    pub provider: &'static str,
    pub started_at: String,
}

/// `GET /api/health`
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        provider: ctx.simplifier.provider_name().unwrap_or("none"),
        started_at: ctx.started_at.clone(),
    })
}
