//! Clone Prompt Store Port - clone prompt 磁盘层
//!
//! 缓存第 2、3 层的后备存储：
//! - `<voice>-<variant>.blob`：按模型变体区分的当前格式
//! - `<voice>.blob`：旧格式，仅属于一个固定变体

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::voice::{ClonePromptBlob, ModelVariant};

/// 存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Clone Prompt Store Port
#[async_trait]
pub trait ClonePromptStorePort: Send + Sync {
    /// 读取按变体区分的 clone prompt
    async fn read(
        &self,
        voice_name: &str,
        variant: &ModelVariant,
    ) -> Result<Option<ClonePromptBlob>, StoreError>;

    /// 写入按变体区分的 clone prompt（原子替换）
    async fn write(
        &self,
        voice_name: &str,
        variant: &ModelVariant,
        blob: &ClonePromptBlob,
    ) -> Result<(), StoreError>;

    /// 读取旧格式的无后缀文件
    async fn read_legacy(&self, voice_name: &str) -> Result<Option<ClonePromptBlob>, StoreError>;

    /// 删除该音色的全部缓存文件，返回删除数量
    async fn remove_voice(&self, voice_name: &str) -> Result<usize, StoreError>;
}
