//! TTS Engine Port - 合成后端抽象
//!
//! 定义合成、音色设计、clone prompt 提取三个外部调用，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::voice::{ClonePromptBlob, GenerationContext, ModelVariant};

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
}

/// 合成时的音色条件
#[derive(Debug, Clone)]
pub enum VoiceConditioning {
    /// 克隆/设计音色：派生的声纹参数
    ClonePrompt(ClonePromptBlob),
    /// 预置说话人 ID
    Speaker(String),
}

/// 单块合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub context: GenerationContext,
    pub voice: VoiceConditioning,
    pub language: String,
    pub model_variant: ModelVariant,
}

/// 单块合成响应
#[derive(Debug, Clone)]
pub struct SynthesisResponse {
    /// 16 位 PCM WAV
    pub audio_data: Vec<u8>,
    /// 音频时长（毫秒）
    pub duration_ms: Option<u64>,
    /// 采样率
    pub sample_rate: Option<u32>,
}

/// 音色设计请求
#[derive(Debug, Clone)]
pub struct DesignRequest {
    pub description: String,
    pub language: String,
}

/// clone prompt 提取请求
#[derive(Debug, Clone)]
pub struct ClonePromptRequest {
    /// 16 位 PCM WAV 样本
    pub sample_audio: Vec<u8>,
    pub description: Option<String>,
    pub model_variant: ModelVariant,
}

/// TTS Engine Port
///
/// 外部合成后端的抽象接口。后端调用是本层唯一的挂起点，本层不设超时
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    /// 合成一块文本
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisResponse, TtsError>;

    /// 按描述生成样本音频（WAV）
    async fn design_voice(&self, request: DesignRequest) -> Result<Vec<u8>, TtsError>;

    /// 从样本音频提取 clone prompt
    async fn extract_clone_prompt(
        &self,
        request: ClonePromptRequest,
    ) -> Result<ClonePromptBlob, TtsError>;

    /// 检查后端是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
