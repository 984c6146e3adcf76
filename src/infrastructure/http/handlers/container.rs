//! Voice Container HTTP Handlers

use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::application::{ExportVoice, ImportVoice};
use crate::infrastructure::http::dto::{ApiResponse, ExportVoiceRequest, ImportVoiceResult};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// `Content-Disposition`：ASCII 回退名 + RFC 5987 编码的原名
fn attachment_header(name: &str) -> String {
    let file_name = format!("{}.voice", name);
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let encoded: String = file_name
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b) {
                (b as char).to_string()
            } else {
                format!("%{:02X}", b)
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}

/// 导出 `.voice` 归档
pub async fn export_voice(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExportVoiceRequest>,
) -> Result<Response, ApiError> {
    let result = state
        .export_voice_handler
        .handle(ExportVoice {
            name: req.name,
            model_variant: req.model_variant,
        })
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                attachment_header(&result.name),
            ),
        ],
        result.archive_data,
    )
        .into_response())
}

/// 导入 `.voice` 归档（multipart: file, model_variant）
pub async fn import_voice(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ImportVoiceResult>>, ApiError> {
    let mut archive_data: Option<Vec<u8>> = None;
    let mut model_variant: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "file" => {
                archive_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?
                        .to_vec(),
                );
            }
            "model_variant" => {
                model_variant = Some(field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read model_variant: {}", e))
                })?);
            }
            _ => {}
        }
    }

    let archive_data =
        archive_data.ok_or_else(|| ApiError::BadRequest("Archive file is required".to_string()))?;

    let result = state
        .import_voice_handler
        .handle(ImportVoice {
            archive_data,
            model_variant,
        })
        .await?;

    Ok(Json(ApiResponse::success(result.into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_attachment_header_plain_name() {
        assert_eq!(
            attachment_header("Ada"),
            "attachment; filename=\"Ada.voice\"; filename*=UTF-8''Ada.voice"
        );
    }

    #[test]
    fn test_attachment_header_is_always_a_valid_header_value() {
        for name in ["Zoë", "a\"b", "tab\there", "new\nline", "語音 1"] {
            let value = attachment_header(name);
            assert!(HeaderValue::from_str(&value).is_ok(), "{}", value);
            assert!(value.is_ascii());
        }
        assert_eq!(
            attachment_header("Zoë"),
            "attachment; filename=\"Zo_.voice\"; filename*=UTF-8''Zo%C3%AB.voice"
        );
    }
}
