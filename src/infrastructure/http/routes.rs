//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping               GET   健康检查（含后端状态、缓存统计）
//! - /api/voice/list         GET   列出所有音色
//! - /api/voice/get          POST  获取音色详情
//! - /api/voice/design       POST  按描述设计音色
//! - /api/voice/clone        POST  上传参考音频克隆音色（multipart）
//! - /api/voice/delete       POST  删除音色
//! - /api/synthesize         POST  合成文本，返回 audio/wav
//! - /api/container/export   POST  导出 .voice 归档
//! - /api/container/import   POST  导入 .voice 归档（multipart）

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/voice", voice_routes())
        .route("/synthesize", post(handlers::synthesize))
        .nest("/container", container_routes())
}

/// Voice 路由
fn voice_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/list", get(handlers::list_voices))
        .route("/get", post(handlers::get_voice))
        .route("/design", post(handlers::design_voice))
        .route("/clone", post(handlers::clone_voice))
        .route("/delete", post(handlers::delete_voice))
}

/// Container 路由
fn container_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/export", post(handlers::export_voice))
        .route("/import", post(handlers::import_voice))
}
