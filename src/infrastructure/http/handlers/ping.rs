//! Ping Handler
//!
//! 健康检查，附带合成后端状态与缓存统计

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::infrastructure::http::dto::{ApiResponse, CacheStatsResponse};
use crate::infrastructure::http::state::AppState;

/// Ping 响应
#[derive(Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub backend_healthy: bool,
    pub clone_prompt_cache: CacheStatsResponse,
}

/// Ping endpoint - 健康检查
pub async fn ping(State(state): State<Arc<AppState>>) -> Json<ApiResponse<PingResponse>> {
    let backend_healthy = state.tts_engine.health_check().await;
    if !backend_healthy {
        tracing::warn!("Synthesis backend is not healthy");
    }

    Json(ApiResponse::success(PingResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        backend_healthy,
        clone_prompt_cache: state.clone_prompt_cache.stats().into(),
    }))
}
