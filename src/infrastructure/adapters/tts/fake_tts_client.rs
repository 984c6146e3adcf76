//! Fake TTS Client - 进程内确定性后端
//!
//! 不调用外部服务，按输入生成确定性的音频与 clone prompt，
//! 并记录各类调用次数（本地开发与测试使用）

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::application::ports::{
    ClonePromptRequest, DesignRequest, SynthesisRequest, SynthesisResponse, TtsEnginePort,
    TtsError, VoiceConditioning,
};
use crate::domain::pcm;
use crate::domain::voice::ClonePromptBlob;

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    /// 采样率
    pub sample_rate: u32,
    /// 每个词生成的样本数
    pub samples_per_word: usize,
    /// 模拟的后端延迟
    pub latency: Duration,
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24000,
            samples_per_word: 240,
            latency: Duration::ZERO,
        }
    }
}

/// Fake TTS Client
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
    synth_calls: AtomicUsize,
    design_calls: AtomicUsize,
    extract_calls: AtomicUsize,
    /// 第 n 次合成调用失败（从 0 开始）
    fail_on_chunk: Option<usize>,
    /// 前 n 次提取调用失败
    failed_extractions: usize,
    fail_design: bool,
}

impl FakeTtsClient {
    pub fn new(config: FakeTtsClientConfig) -> Self {
        tracing::info!(
            sample_rate = config.sample_rate,
            samples_per_word = config.samples_per_word,
            "FakeTtsClient initialized"
        );
        Self {
            config,
            synth_calls: AtomicUsize::new(0),
            design_calls: AtomicUsize::new(0),
            extract_calls: AtomicUsize::new(0),
            fail_on_chunk: None,
            failed_extractions: 0,
            fail_design: false,
        }
    }

    /// 使用默认配置创建
    pub fn with_defaults() -> Self {
        Self::new(FakeTtsClientConfig::default())
    }

    pub fn failing_on_chunk(mut self, index: usize) -> Self {
        self.fail_on_chunk = Some(index);
        self
    }

    pub fn failing_extraction(mut self) -> Self {
        self.failed_extractions = usize::MAX;
        self
    }

    pub fn failing_first_extractions(mut self, count: usize) -> Self {
        self.failed_extractions = count;
        self
    }

    pub fn failing_design(mut self) -> Self {
        self.fail_design = true;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.config.latency = latency;
        self
    }

    pub fn synth_calls(&self) -> usize {
        self.synth_calls.load(Ordering::SeqCst)
    }

    pub fn design_calls(&self) -> usize {
        self.design_calls.load(Ordering::SeqCst)
    }

    pub fn extract_calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.synth_calls() + self.design_calls() + self.extract_calls()
    }

    /// 由文本确定性生成的 clone prompt
    pub fn expected_prompt(model_variant: &str, sample_len: usize) -> ClonePromptBlob {
        ClonePromptBlob::from(format!("fake:{}:{}", model_variant, sample_len).into_bytes())
    }

    async fn simulate_latency(&self) {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
    }
}

#[async_trait]
impl TtsEnginePort for FakeTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisResponse, TtsError> {
        let call = self.synth_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.fail_on_chunk == Some(call) {
            return Err(TtsError::ServiceError(format!("fake failure on call {}", call)));
        }

        let words = request.context.phrase.split_whitespace().count().max(1);
        let n = words * self.config.samples_per_word;
        let level = match &request.voice {
            VoiceConditioning::ClonePrompt(blob) => blob.len() as i16,
            VoiceConditioning::Speaker(id) => id.len() as i16,
        };
        let samples = vec![level; n];

        tracing::debug!(words, samples = n, "FakeTtsClient: synthesized chunk");

        Ok(SynthesisResponse {
            audio_data: pcm::build(&samples, self.config.sample_rate),
            duration_ms: Some(n as u64 * 1000 / self.config.sample_rate as u64),
            sample_rate: Some(self.config.sample_rate),
        })
    }

    async fn design_voice(&self, request: DesignRequest) -> Result<Vec<u8>, TtsError> {
        self.design_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.fail_design {
            return Err(TtsError::ModelUnavailable("fake design backend offline".to_string()));
        }
        let samples = vec![1i16; 100 + request.description.len()];
        Ok(pcm::build(&samples, self.config.sample_rate))
    }

    async fn extract_clone_prompt(
        &self,
        request: ClonePromptRequest,
    ) -> Result<ClonePromptBlob, TtsError> {
        let call = self.extract_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if call < self.failed_extractions {
            return Err(TtsError::ServiceError(format!(
                "fake extraction failure on call {}",
                call
            )));
        }
        Ok(Self::expected_prompt(
            request.model_variant.as_str(),
            request.sample_audio.len(),
        ))
    }

    async fn health_check(&self) -> bool {
        true
    }
}
