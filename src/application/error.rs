//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::{
    AudioStorageError, CacheError, ContainerError, ReferenceAudioError, RepositoryError,
    StoreError, TtsError,
};
use crate::domain::voice::VoiceError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 音色不存在
    #[error("Voice not found: {0}")]
    VoiceNotFound(String),

    /// clone prompt 推导失败（最后一层）
    #[error("Clone extraction failed: {0}")]
    CloneExtractionFailed(String),

    /// 第 chunk_index 块合成失败，不返回部分结果
    #[error("Synthesis failed at chunk {chunk_index}: {detail}")]
    SynthesisFailed { chunk_index: usize, detail: String },

    #[error("Container import failed: {0}")]
    ContainerImportFailed(String),

    #[error("Container update failed: {0}")]
    ContainerUpdateFailed(String),

    /// 仅用于日志，不会返回给调用方
    #[error("Cache write warning: {0}")]
    CacheWriteWarning(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 仓储错误
    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    pub fn voice_not_found(name: impl Into<String>) -> Self {
        Self::VoiceNotFound(name.into())
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    pub fn synthesis_failed(chunk_index: usize, detail: impl Into<String>) -> Self {
        Self::SynthesisFailed {
            chunk_index,
            detail: detail.into(),
        }
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        Self::RepositoryError(err.to_string())
    }
}

impl From<StoreError> for ApplicationError {
    fn from(err: StoreError) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<CacheError> for ApplicationError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::CloneExtractionFailed { voice, detail } => {
                Self::CloneExtractionFailed(format!("{}: {}", voice, detail))
            }
            CacheError::StorageError(msg) => Self::StorageError(msg),
        }
    }
}

impl From<ContainerError> for ApplicationError {
    fn from(err: ContainerError) -> Self {
        match err {
            ContainerError::ImportFailed(msg) => Self::ContainerImportFailed(msg),
            ContainerError::UpdateFailed(msg) => Self::ContainerUpdateFailed(msg),
            ContainerError::ExportFailed(msg) => Self::InternalError(msg),
            ContainerError::IoError(msg) => Self::StorageError(msg),
        }
    }
}

impl From<TtsError> for ApplicationError {
    fn from(err: TtsError) -> Self {
        match err {
            TtsError::ModelUnavailable(msg) => Self::ModelUnavailable(msg),
            other => Self::InternalError(other.to_string()),
        }
    }
}

impl From<ReferenceAudioError> for ApplicationError {
    fn from(err: ReferenceAudioError) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<AudioStorageError> for ApplicationError {
    fn from(err: AudioStorageError) -> Self {
        match err {
            AudioStorageError::InvalidName(msg) => Self::ValidationError(msg),
            other => Self::StorageError(other.to_string()),
        }
    }
}

impl From<VoiceError> for ApplicationError {
    fn from(err: VoiceError) -> Self {
        Self::ValidationError(err.to_string())
    }
}
