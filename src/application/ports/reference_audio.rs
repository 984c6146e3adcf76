//! Reference Audio Port - 参考音频读取
//!
//! 将克隆音色的参考音频（WAV/MP3/FLAC）统一为 16 位单声道 PCM WAV

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReferenceAudioError {
    #[error("Reference audio not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),
}

#[async_trait]
pub trait ReferenceAudioPort: Send + Sync {
    /// 读取并规范化参考音频
    async fn load(&self, path: &Path) -> Result<Vec<u8>, ReferenceAudioError>;

    /// 规范化内存中的音频（如归档内的参考音频），`extension` 仅作格式提示
    async fn normalize(
        &self,
        data: Vec<u8>,
        extension: Option<&str>,
    ) -> Result<Vec<u8>, ReferenceAudioError>;
}
