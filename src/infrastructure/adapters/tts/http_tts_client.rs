//! HTTP TTS Client - 调用外部 TTS HTTP 服务
//!
//! 实现 TtsEnginePort trait，通过 HTTP 调用外部 TTS 服务
//!
//! 外部 TTS API:
//! - POST /api/tts/synthesize   multipart: text, language, model_variant, metadata(JSON),
//!                              clone_prompt(文件) 或 speaker
//! - POST /api/tts/design       JSON: {"description": "...", "language": "..."} -> audio/wav
//! - POST /api/tts/clone-prompt multipart: audio(文件), model_variant, description -> 二进制
//! - GET  /health
//!
//! 合成响应为 audio/wav，元数据在 headers 中

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{
    ClonePromptRequest, DesignRequest, SynthesisRequest, SynthesisResponse, TtsEnginePort,
    TtsError, VoiceConditioning,
};
use crate::domain::voice::ClonePromptBlob;

/// 音色设计请求体 (JSON)
#[derive(Debug, Serialize)]
struct DesignHttpRequest<'a> {
    description: &'a str,
    language: &'a str,
}

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// TTS 服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 120,
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP TTS 客户端
pub struct HttpTtsClient {
    client: Client,
    config: HttpTtsClientConfig,
}

impl HttpTtsClient {
    /// 创建新的 HTTP TTS 客户端
    pub fn new(config: HttpTtsClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn map_send_error(e: reqwest::Error) -> TtsError {
        if e.is_timeout() {
            TtsError::Timeout
        } else if e.is_connect() {
            TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
        } else {
            TtsError::NetworkError(e.to_string())
        }
    }

    /// 非 2xx 响应转为错误；503 表示模型不可用
    async fn check_status(response: Response) -> Result<Response, TtsError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let error_text = response.text().await.unwrap_or_default();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(TtsError::ModelUnavailable(error_text));
        }
        Err(TtsError::ServiceError(format!(
            "HTTP {}: {}",
            status, error_text
        )))
    }

    async fn read_bytes(response: Response, what: &str) -> Result<Vec<u8>, TtsError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::InvalidResponse(format!("Failed to read {}: {}", what, e)))?;
        if bytes.is_empty() {
            return Err(TtsError::InvalidResponse(format!("Empty {}", what)));
        }
        Ok(bytes.to_vec())
    }

    fn wav_part(bytes: Vec<u8>, file_name: &str) -> Result<Part, TtsError> {
        Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("audio/wav")
            .map_err(|e| TtsError::ServiceError(e.to_string()))
    }
}

#[async_trait]
impl TtsEnginePort for HttpTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisResponse, TtsError> {
        let metadata = serde_json::to_string(request.context.metadata())
            .map_err(|e| TtsError::ServiceError(e.to_string()))?;

        let mut form = Form::new()
            .text("text", request.context.phrase.clone())
            .text("language", request.language.clone())
            .text("model_variant", request.model_variant.as_str().to_string())
            .text("metadata", metadata);
        form = match &request.voice {
            VoiceConditioning::ClonePrompt(blob) => form.part(
                "clone_prompt",
                Part::bytes(blob.as_bytes().to_vec()).file_name("clone-prompt.bin"),
            ),
            VoiceConditioning::Speaker(speaker) => form.text("speaker", speaker.clone()),
        };

        tracing::debug!(
            url = %self.url("/api/tts/synthesize"),
            text_len = request.context.phrase.len(),
            model_variant = %request.model_variant,
            "Sending TTS synthesize request"
        );

        let response = self
            .client
            .post(self.url("/api/tts/synthesize"))
            .multipart(form)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let response = Self::check_status(response).await?;

        // 从 headers 提取元数据
        let headers = response.headers();
        let duration_ms = headers
            .get("X-TTS-Duration-Ms")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let sample_rate = headers
            .get("X-TTS-Sample-Rate")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        let audio_data = Self::read_bytes(response, "audio").await?;

        tracing::debug!(
            duration_ms = ?duration_ms,
            sample_rate = ?sample_rate,
            audio_size = audio_data.len(),
            "TTS synthesis completed"
        );

        Ok(SynthesisResponse {
            audio_data,
            duration_ms,
            sample_rate,
        })
    }

    async fn design_voice(&self, request: DesignRequest) -> Result<Vec<u8>, TtsError> {
        let body = DesignHttpRequest {
            description: &request.description,
            language: &request.language,
        };

        let response = self
            .client
            .post(self.url("/api/tts/design"))
            .json(&body)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let response = Self::check_status(response).await?;
        let audio = Self::read_bytes(response, "design sample").await?;

        tracing::info!(audio_size = audio.len(), "Voice design completed");
        Ok(audio)
    }

    async fn extract_clone_prompt(
        &self,
        request: ClonePromptRequest,
    ) -> Result<ClonePromptBlob, TtsError> {
        let mut form = Form::new()
            .part("audio", Self::wav_part(request.sample_audio, "sample.wav")?)
            .text("model_variant", request.model_variant.as_str().to_string());
        if let Some(description) = request.description {
            form = form.text("description", description);
        }

        let response = self
            .client
            .post(self.url("/api/tts/clone-prompt"))
            .multipart(form)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let response = Self::check_status(response).await?;
        let blob = Self::read_bytes(response, "clone prompt").await?;

        tracing::info!(
            model_variant = %request.model_variant,
            size = blob.len(),
            "Clone prompt extracted"
        );
        Ok(ClonePromptBlob::from(blob))
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.url("/health"))
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
