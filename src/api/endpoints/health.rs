//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub ocr_available: bool,
    pub version: &'static str,
}

/// `GET /api/health` — liveness plus which optional components are up.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model_loaded: ctx.core.risk_model().is_some(),
        ocr_available: ctx.core.ocr_engine().is_some(),
        version: crate::config::APP_VERSION,
    })
}
