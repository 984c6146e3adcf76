//! Voice HTTP Handlers

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::path::Path;
use std::sync::Arc;

use crate::application::{CloneVoice, DeleteVoice, DesignVoice, GetVoice, ListVoices, VoiceResponse};
use crate::infrastructure::http::dto::{
    ApiResponse, DeleteVoiceRequest, DeleteVoiceResult, DesignVoiceRequest, GetVoiceRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 获取音色列表
pub async fn list_voices(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<VoiceResponse>>>, ApiError> {
    let result = state.list_voices_handler.handle(ListVoices).await?;
    Ok(Json(ApiResponse::success(result)))
}

/// 获取音色详情（未指定名称时返回默认音色）
pub async fn get_voice(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GetVoiceRequest>,
) -> Result<Json<ApiResponse<VoiceResponse>>, ApiError> {
    let result = state
        .get_voice_handler
        .handle(GetVoice { name: req.name })
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// 按描述设计音色
pub async fn design_voice(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DesignVoiceRequest>,
) -> Result<Json<ApiResponse<VoiceResponse>>, ApiError> {
    let voice = state
        .design_voice_handler
        .handle(DesignVoice {
            name: req.name,
            description: req.description,
        })
        .await?;
    Ok(Json(ApiResponse::success(VoiceResponse::from_record(&voice, false))))
}

/// 上传参考音频克隆音色
pub async fn clone_voice(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<VoiceResponse>>, ApiError> {
    let mut name: Option<String> = None;
    let mut description: Option<String> = None;
    let mut audio_data: Option<Vec<u8>> = None;
    let mut audio_ext: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "name" => {
                name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Failed to read name: {}", e)))?,
                );
            }
            "description" => {
                description = Some(field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read description: {}", e))
                })?);
            }
            "file" => {
                audio_ext = field.file_name().and_then(|f| {
                    Path::new(f)
                        .extension()
                        .and_then(|e| e.to_str())
                        .map(str::to_string)
                });
                audio_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?
                        .to_vec(),
                );
            }
            _ => {}
        }
    }

    let name = name.ok_or_else(|| ApiError::BadRequest("Name is required".to_string()))?;
    let audio_data =
        audio_data.ok_or_else(|| ApiError::BadRequest("Audio file is required".to_string()))?;

    let voice = state
        .clone_voice_handler
        .handle(CloneVoice {
            name,
            description,
            audio_data,
            extension: audio_ext.unwrap_or_else(|| "wav".to_string()),
        })
        .await?;

    Ok(Json(ApiResponse::success(VoiceResponse::from_record(&voice, false))))
}

/// 删除音色及其缓存文件
pub async fn delete_voice(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeleteVoiceRequest>,
) -> Result<Json<ApiResponse<DeleteVoiceResult>>, ApiError> {
    let result = state
        .delete_voice_handler
        .handle(DeleteVoice { name: req.name })
        .await?;
    Ok(Json(ApiResponse::success(result.into())))
}
