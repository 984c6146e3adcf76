//! Synthesis HTTP Handler

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::application::SynthesizeSpeech;
use crate::infrastructure::http::dto::SynthesizeRequest;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 合成整段文本，返回单个 WAV
pub async fn synthesize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SynthesizeRequest>,
) -> Result<Response, ApiError> {
    let output = state
        .synthesize_handler
        .handle(SynthesizeSpeech {
            text: req.text,
            voice_name: req.voice,
            language: req.language,
            model_variant: req.model_variant,
            metadata: req.metadata,
        })
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "audio/wav".to_string()),
            (header::HeaderName::from_static("x-voice-name"), output.voice_name),
            (
                header::HeaderName::from_static("x-chunk-count"),
                output.chunk_count.to_string(),
            ),
        ],
        output.audio_data,
    )
        .into_response())
}
