//! Clone Prompt Cache Port - 分层 clone prompt 缓存
//!
//! 按 (音色, 模型变体) 以最低代价得到 clone prompt：
//! 内存 → 按变体磁盘文件 → 旧格式磁盘文件 → 归档重新提取 → 冷推导

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::voice::{ClonePromptBlob, ModelVariant, VoiceRecord};

/// 缓存错误
#[derive(Debug, Error)]
pub enum CacheError {
    /// 最后一层推导失败，没有可用的 clone prompt
    #[error("Clone extraction failed for '{voice}': {detail}")]
    CloneExtractionFailed { voice: String, detail: String },

    #[error("Cache storage error: {0}")]
    StorageError(String),
}

/// 命中的缓存层
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    Memory,
    ModelDisk,
    LegacyDisk,
    Container,
    ColdDerivation,
}

impl CacheTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheTier::Memory => "memory",
            CacheTier::ModelDisk => "model_disk",
            CacheTier::LegacyDisk => "legacy_disk",
            CacheTier::Container => "container",
            CacheTier::ColdDerivation => "cold_derivation",
        }
    }
}

/// 缓存统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClonePromptCacheStats {
    pub memory_entries: usize,
    pub memory_hits: u64,
    pub model_disk_hits: u64,
    pub legacy_disk_hits: u64,
    pub container_extractions: u64,
    pub cold_derivations: u64,
}

/// Clone Prompt Cache Port
#[async_trait]
pub trait ClonePromptCachePort: Send + Sync {
    /// 取得 clone prompt，按层级顺序查找，命中即止
    async fn get_or_derive(
        &self,
        voice: &VoiceRecord,
        variant: &ModelVariant,
    ) -> Result<ClonePromptBlob, CacheError>;

    /// 写入已知的 clone prompt（导入时），取代已有条目
    async fn seed(&self, voice_name: &str, variant: &ModelVariant, blob: ClonePromptBlob);

    /// 清除该音色在内存与磁盘上的全部条目，返回删除的磁盘文件数
    async fn evict_voice(&self, voice_name: &str) -> Result<usize, CacheError>;

    /// 获取缓存统计信息
    fn stats(&self) -> ClonePromptCacheStats;
}
