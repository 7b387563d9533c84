use axum::extract::State;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::v1::response::ApiResponse;

/// Health data returned inside the v1 envelope.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HealthData {
    /// `ok` when the engine is ready, `degraded` when it is not.
    pub status: String,
    pub version: String,
    pub ocr: OcrStatus,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct OcrStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// `GET /api/v1/health`
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health status", body = HealthData),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthData> {
    let ocr = &state.ocr;
    let language = ocr.config().language.clone();

    let ocr_status = match ocr.engine_name() {
        Some(engine) => OcrStatus {
            status: "available".to_string(),
            engine: Some(engine.to_string()),
            language,
            reason: None,
        },
        None => OcrStatus {
            status: "unavailable".to_string(),
            engine: None,
            language,
            reason: ocr.unavailable_reason().map(str::to_string),
        },
    };

    let status = if ocr.is_available() { "ok" } else { "degraded" };

    ApiResponse::success(HealthData {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        ocr: ocr_status,
    })
}
