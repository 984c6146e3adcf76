//! Voice Query Handlers - 音色目录
//!
//! 自定义音色优先于同名内置音色

use serde::Serialize;
use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::VoiceRepositoryPort;
use crate::application::queries::{GetVoice, ListVoices};
use crate::domain::voice::{VoiceKind, VoiceRecord};

/// 未指定音色名时的占位名称
pub const DEFAULT_VOICE_PLACEHOLDER: &str = "(default)";

// ============================================================================
// Response DTOs
// ============================================================================

/// 音色详情响应
#[derive(Debug, Clone, Serialize)]
pub struct VoiceResponse {
    pub name: String,
    pub kind: &'static str,
    pub description: Option<String>,
    /// 参考音频路径或预置说话人 ID
    pub source_reference: Option<String>,
    pub builtin: bool,
    pub created_at: String,
}

impl VoiceResponse {
    pub fn from_record(record: &VoiceRecord, builtin: bool) -> Self {
        let source_reference = match record.kind() {
            VoiceKind::Cloned { reference_audio } => {
                Some(reference_audio.to_string_lossy().to_string())
            }
            VoiceKind::PresetSpeaker { speaker_id } => Some(speaker_id.clone()),
            VoiceKind::Builtin | VoiceKind::Designed => None,
        };
        Self {
            name: record.name().to_string(),
            kind: record.kind().as_str(),
            description: record.description().map(str::to_string),
            source_reference,
            builtin,
            created_at: record.created_at().to_rfc3339(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GetVoice Handler
pub struct GetVoiceHandler {
    voice_repo: Arc<dyn VoiceRepositoryPort>,
    builtins: Arc<Vec<VoiceRecord>>,
}

impl GetVoiceHandler {
    pub fn new(voice_repo: Arc<dyn VoiceRepositoryPort>, builtins: Arc<Vec<VoiceRecord>>) -> Self {
        Self {
            voice_repo,
            builtins,
        }
    }

    /// 解析音色
    ///
    /// - 未指定：第一个内置音色
    /// - 指定：先查自定义音色，再查内置音色
    pub async fn resolve(&self, name: Option<&str>) -> Result<VoiceRecord, ApplicationError> {
        let Some(name) = name else {
            return self
                .builtins
                .first()
                .cloned()
                .ok_or_else(|| ApplicationError::voice_not_found(DEFAULT_VOICE_PLACEHOLDER));
        };

        if let Some(voice) = self.voice_repo.find_by_name(name).await? {
            return Ok(voice);
        }
        self.builtins
            .iter()
            .find(|v| v.name().as_str() == name)
            .cloned()
            .ok_or_else(|| ApplicationError::voice_not_found(name))
    }

    pub async fn handle(&self, query: GetVoice) -> Result<VoiceResponse, ApplicationError> {
        let voice = self.resolve(query.name.as_deref()).await?;
        let builtin = self.builtins.iter().any(|b| b == &voice);
        Ok(VoiceResponse::from_record(&voice, builtin))
    }
}

/// ListVoices Handler
pub struct ListVoicesHandler {
    voice_repo: Arc<dyn VoiceRepositoryPort>,
    builtins: Arc<Vec<VoiceRecord>>,
}

impl ListVoicesHandler {
    pub fn new(voice_repo: Arc<dyn VoiceRepositoryPort>, builtins: Arc<Vec<VoiceRecord>>) -> Self {
        Self {
            voice_repo,
            builtins,
        }
    }

    /// 内置音色在前，自定义音色在后；同名时只保留自定义音色
    pub async fn handle(&self, _query: ListVoices) -> Result<Vec<VoiceResponse>, ApplicationError> {
        let custom = self.voice_repo.find_all().await?;

        let mut voices: Vec<VoiceResponse> = self
            .builtins
            .iter()
            .filter(|b| !custom.iter().any(|c| c.name() == b.name()))
            .map(|b| VoiceResponse::from_record(b, true))
            .collect();
        voices.extend(custom.iter().map(|c| VoiceResponse::from_record(c, false)));
        Ok(voices)
    }
}
