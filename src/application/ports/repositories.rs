//! Repository Ports - 出站端口
//!
//! 音色索引的持久化抽象，具体实现在 infrastructure 层（JSON 文件）

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::voice::VoiceRecord;

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Voice Repository Port
///
/// 有序的音色索引，按名称覆盖保存
#[async_trait]
pub trait VoiceRepositoryPort: Send + Sync {
    /// 保存音色（同名替换）
    async fn save(&self, voice: &VoiceRecord) -> Result<(), RepositoryError>;

    /// 根据名称查找音色
    async fn find_by_name(&self, name: &str) -> Result<Option<VoiceRecord>, RepositoryError>;

    /// 获取所有音色（保存顺序）
    async fn find_all(&self) -> Result<Vec<VoiceRecord>, RepositoryError>;

    /// 删除音色，返回是否存在
    async fn delete(&self, name: &str) -> Result<bool, RepositoryError>;
}
