//! Voice Container Port - 音色归档
//!
//! 归档是规范的交换产物：导入/更新失败总是上抛，不存在可回退的下层

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::container::{ContainerManifest, ProvenanceMethod};
use crate::domain::voice::{ClonePromptBlob, ModelVariant};

/// 归档错误
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Container import failed: {0}")]
    ImportFailed(String),

    #[error("Container update failed: {0}")]
    UpdateFailed(String),

    #[error("Container export failed: {0}")]
    ExportFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// 导入结果
///
/// 只有完整读取成功才会构造，不存在部分填充的结果
#[derive(Debug, Clone)]
pub struct ImportedVoice {
    pub manifest: ContainerManifest,
    /// 归档中带有 clone prompt 的变体 slug
    pub supported_model_variants: Vec<String>,
    /// 所请求变体的 clone prompt
    pub clone_prompt: Option<ClonePromptBlob>,
    /// 引擎生成的样本音频
    pub sample_audio: Option<Vec<u8>>,
    /// 文件名 -> 参考音频
    pub reference_audio: BTreeMap<String, Vec<u8>>,
}

impl ImportedVoice {
    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    pub fn description(&self) -> Option<&str> {
        self.manifest.description.as_deref()
    }

    pub fn provenance_method(&self) -> ProvenanceMethod {
        self.manifest.provenance.method
    }
}

/// Voice Container Port
#[async_trait]
pub trait VoiceContainerPort: Send + Sync {
    /// 新建归档：清单 + 可选 clone prompt / 样本音频 + 参考音频（置于 `reference/` 下）
    async fn export(
        &self,
        manifest: &ContainerManifest,
        clone_prompt: Option<(&ModelVariant, &ClonePromptBlob)>,
        sample_audio: Option<&[u8]>,
        reference_audio: &[(String, Vec<u8>)],
    ) -> Result<Vec<u8>, ContainerError>;

    /// 解析归档
    async fn import(&self, archive: &[u8], variant: &ModelVariant)
        -> Result<ImportedVoice, ContainerError>;

    /// 查找音色对应的归档文件
    async fn locate(&self, voice_name: &str) -> Option<PathBuf>;

    /// 读取并解析归档文件
    async fn load(&self, path: &Path, variant: &ModelVariant)
        -> Result<ImportedVoice, ContainerError>;

    /// 保存为音色的归档文件（整文件原子替换）
    async fn store(&self, voice_name: &str, archive: &[u8]) -> Result<PathBuf, ContainerError>;

    /// 只替换该变体的 clone prompt，其余条目保持不变
    async fn update_clone_prompt(
        &self,
        path: &Path,
        blob: &ClonePromptBlob,
        variant: &ModelVariant,
    ) -> Result<(), ContainerError>;

    /// 只替换样本音频，其余条目保持不变
    async fn update_sample_audio(&self, path: &Path, sample: &[u8]) -> Result<(), ContainerError>;

    /// 删除音色的归档文件，返回是否存在
    async fn remove(&self, voice_name: &str) -> Result<bool, ContainerError>;
}
