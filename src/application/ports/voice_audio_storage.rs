//! Voice Audio Storage Port - 音色音频文件存储
//!
//! 克隆音色的参考音频、导入归档中的参考/样本音频

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 音频存储错误
#[derive(Debug, Error)]
pub enum AudioStorageError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid file name: {0}")]
    InvalidName(String),
}

/// Voice Audio Storage Port
#[async_trait]
pub trait VoiceAudioStoragePort: Send + Sync {
    /// 保存克隆音色的参考音频：`<voice>.<ext>`
    async fn save_reference(
        &self,
        voice_name: &str,
        extension: &str,
        data: &[u8],
    ) -> Result<PathBuf, AudioStorageError>;

    /// 保存导入的音频：`<voice>/<file name>`
    async fn save_imported(
        &self,
        voice_name: &str,
        file_name: &str,
        data: &[u8],
    ) -> Result<PathBuf, AudioStorageError>;

    /// 读取音频文件
    async fn read(&self, path: &Path) -> Result<Vec<u8>, AudioStorageError>;
}
