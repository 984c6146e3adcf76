//! Synthesis Command Handler - 分块合成编排
//!
//! 请求状态：Resolving → (PresetPath | ClonePath) → Chunking → Synthesizing[i] → Concatenating → Done，
//! 任一块失败直接进入 Failed(i)，不返回部分结果

use std::sync::Arc;

use crate::application::commands::SynthesizeSpeech;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    ClonePromptCachePort, SynthesisRequest, TtsEnginePort, VoiceConditioning,
};
use crate::application::queries::handlers::GetVoiceHandler;
use crate::domain::pcm::{self, PcmError};
use crate::domain::voice::{GenerationContext, ModelVariant, VoiceKind};
use crate::domain::{chunk_text, ChunkConfig};

/// 合成相关设置
#[derive(Debug, Clone)]
pub struct SynthesisSettings {
    pub language: String,
    pub model_variant: ModelVariant,
    pub max_words: usize,
    /// 无法从首块读取采样率时使用
    pub sample_rate: u32,
    /// 写入归档 provenance 的引擎标识
    pub engine_name: String,
}

impl SynthesisSettings {
    /// 请求指定的变体，否则使用默认变体
    pub fn variant_or_default(&self, requested: Option<&str>) -> Result<ModelVariant, ApplicationError> {
        match requested.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => Ok(ModelVariant::new(v)?),
            None => Ok(self.model_variant.clone()),
        }
    }
}

/// 请求所处阶段（仅用于日志）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisPhase {
    Resolving,
    PresetPath,
    ClonePath,
    Chunking,
    Synthesizing { index: usize, total: usize },
    Concatenating,
    Done,
    Failed { chunk_index: usize },
}

/// 合成结果
#[derive(Debug, Clone)]
pub struct SynthesisOutput {
    /// 单个 16 位 PCM WAV
    pub audio_data: Vec<u8>,
    pub sample_rate: u32,
    pub chunk_count: usize,
    pub voice_name: String,
}

/// SynthesizeSpeech Handler
pub struct SynthesizeHandler {
    voices: Arc<GetVoiceHandler>,
    cache: Arc<dyn ClonePromptCachePort>,
    engine: Arc<dyn TtsEnginePort>,
    settings: SynthesisSettings,
}

impl SynthesizeHandler {
    pub fn new(
        voices: Arc<GetVoiceHandler>,
        cache: Arc<dyn ClonePromptCachePort>,
        engine: Arc<dyn TtsEnginePort>,
        settings: SynthesisSettings,
    ) -> Self {
        Self {
            voices,
            cache,
            engine,
            settings,
        }
    }

    fn enter(request_voice: &str, phase: SynthesisPhase) {
        tracing::debug!(voice = %request_voice, phase = ?phase, "Synthesis phase");
    }

    pub async fn handle(&self, command: SynthesizeSpeech) -> Result<SynthesisOutput, ApplicationError> {
        let label = command.voice_name.as_deref().unwrap_or("(default)");
        Self::enter(label, SynthesisPhase::Resolving);
        let voice = self.voices.resolve(command.voice_name.as_deref()).await?;
        let voice_name = voice.name().to_string();

        let variant = self
            .settings
            .variant_or_default(command.model_variant.as_deref())?;
        let language = command
            .language
            .clone()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| self.settings.language.clone());

        // 空文本不值得推导 clone prompt，先分块
        let chunks = chunk_text(
            &command.text,
            &ChunkConfig {
                max_words: self.settings.max_words,
            },
        );
        if chunks.is_empty() {
            return Err(ApplicationError::validation("text is empty"));
        }

        let conditioning = match voice.kind() {
            VoiceKind::PresetSpeaker { speaker_id } => {
                Self::enter(&voice_name, SynthesisPhase::PresetPath);
                VoiceConditioning::Speaker(speaker_id.clone())
            }
            VoiceKind::Builtin | VoiceKind::Designed | VoiceKind::Cloned { .. } => {
                Self::enter(&voice_name, SynthesisPhase::ClonePath);
                VoiceConditioning::ClonePrompt(self.cache.get_or_derive(&voice, &variant).await?)
            }
        };

        Self::enter(&voice_name, SynthesisPhase::Chunking);
        tracing::info!(
            voice = %voice_name,
            kind = voice.kind().as_str(),
            model_variant = %variant,
            chunks = chunks.len(),
            "Synthesis started"
        );

        let total = chunks.len();
        let mut buffers = Vec::with_capacity(total);
        for (index, chunk) in chunks.into_iter().enumerate() {
            Self::enter(&voice_name, SynthesisPhase::Synthesizing { index, total });

            let mut context = GenerationContext::new(chunk);
            for (key, value) in &command.metadata {
                context.insert(key, value.clone());
            }
            let request = SynthesisRequest {
                context,
                voice: conditioning.clone(),
                language: language.clone(),
                model_variant: variant.clone(),
            };

            match self.engine.synthesize(request).await {
                Ok(response) => buffers.push(response.audio_data),
                Err(e) => {
                    Self::enter(&voice_name, SynthesisPhase::Failed { chunk_index: index });
                    tracing::error!(voice = %voice_name, chunk_index = index, error = %e, "Chunk synthesis failed");
                    return Err(ApplicationError::synthesis_failed(index, e.to_string()));
                }
            }
        }

        Self::enter(&voice_name, SynthesisPhase::Concatenating);
        let sample_rate = buffers
            .first()
            .and_then(|b| pcm::sample_rate_of(b))
            .unwrap_or(self.settings.sample_rate);
        let audio_data = pcm::concatenate(&buffers, sample_rate).map_err(|e| match e {
            PcmError::SegmentTooShort { index, .. } => {
                ApplicationError::synthesis_failed(index, e.to_string())
            }
            other => ApplicationError::internal(other.to_string()),
        })?;

        Self::enter(&voice_name, SynthesisPhase::Done);
        tracing::info!(
            voice = %voice_name,
            chunks = total,
            sample_rate,
            size = audio_data.len(),
            "Synthesis completed"
        );

        Ok(SynthesisOutput {
            audio_data,
            sample_rate,
            chunk_count: total,
            voice_name,
        })
    }
}
