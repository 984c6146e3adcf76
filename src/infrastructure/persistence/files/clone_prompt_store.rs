//! File Clone Prompt Store
//!
//! 实现 ClonePromptStorePort：
//! - `<voice>-<slug>.blob`：bincode 信封，携带音色名与模型变体标签
//! - `<voice>.blob`：旧格式原始字节

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use super::atomic::write_atomic;
use crate::application::ports::{ClonePromptStorePort, StoreError};
use crate::domain::voice::{ClonePromptBlob, ModelVariant};

const MAGIC: [u8; 4] = *b"VXCP";
const ENVELOPE_VERSION: u16 = 1;
const BLOB_EXTENSION: &str = ".blob";

/// 磁盘信封
#[derive(Debug, Serialize, Deserialize)]
struct BlobEnvelope {
    magic: [u8; 4],
    version: u16,
    voice_name: String,
    model_variant: String,
    created_at: i64,
    payload: Vec<u8>,
}

enum StoredBlob {
    Envelope(BlobEnvelope),
    /// 无信封的早期文件
    Raw(Vec<u8>),
}

fn decode(bytes: Vec<u8>) -> Result<StoredBlob, StoreError> {
    if !bytes.starts_with(&MAGIC) {
        return Ok(StoredBlob::Raw(bytes));
    }
    let envelope: BlobEnvelope = bincode::deserialize(&bytes)
        .map_err(|e| StoreError::SerializationError(e.to_string()))?;
    if envelope.version > ENVELOPE_VERSION {
        return Err(StoreError::SerializationError(format!(
            "unsupported blob envelope version {}",
            envelope.version
        )));
    }
    Ok(StoredBlob::Envelope(envelope))
}

/// 文件系统 clone prompt 存储
pub struct FileClonePromptStore {
    base_dir: PathBuf,
    /// 无信封文件只能按文件名判断归属，仅这些 slug 视为变体后缀
    known_slugs: Vec<String>,
}

impl FileClonePromptStore {
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base_dir = base_dir.as_ref().to_path_buf();

        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| StoreError::IoError(e.to_string()))?;

        Ok(Self {
            base_dir,
            known_slugs: Vec::new(),
        })
    }

    pub fn with_known_variants<'a>(
        mut self,
        variants: impl IntoIterator<Item = &'a ModelVariant>,
    ) -> Self {
        for variant in variants {
            let slug = variant.slug();
            if !self.known_slugs.contains(&slug) {
                self.known_slugs.push(slug);
            }
        }
        self
    }

    fn model_path(&self, voice_name: &str, variant: &ModelVariant) -> PathBuf {
        self.base_dir
            .join(format!("{}-{}{}", voice_name, variant.slug(), BLOB_EXTENSION))
    }

    fn legacy_path(&self, voice_name: &str) -> PathBuf {
        self.base_dir.join(format!("{}{}", voice_name, BLOB_EXTENSION))
    }

    async fn read_file(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::IoError(e.to_string())),
        }
    }

    /// 文件是否属于该音色
    ///
    /// `a-b.blob` 既可能是音色 `a-b` 的旧格式文件，也可能是音色 `a` 的 `b` 变体。
    /// 带信封的文件以信封内的音色名为准；无信封的只在 `b` 是已知变体时归属 `a`
    async fn belongs_to(&self, path: &Path, file_name: &str, voice_name: &str) -> bool {
        let Some(stem) = file_name.strip_suffix(BLOB_EXTENSION) else {
            return false;
        };
        if stem == voice_name {
            return true;
        }
        let slug = match stem.rsplit_once('-') {
            Some((prefix, slug)) if prefix == voice_name && !slug.is_empty() => slug,
            _ => return false,
        };
        let known = self.known_slugs.iter().any(|s| s == slug);
        match Self::read_file(path).await {
            Ok(Some(bytes)) => match decode(bytes) {
                Ok(StoredBlob::Envelope(envelope)) => envelope.voice_name == voice_name,
                Ok(StoredBlob::Raw(_)) | Err(_) => known,
            },
            _ => false,
        }
    }
}

#[async_trait]
impl ClonePromptStorePort for FileClonePromptStore {
    async fn read(
        &self,
        voice_name: &str,
        variant: &ModelVariant,
    ) -> Result<Option<ClonePromptBlob>, StoreError> {
        let path = self.model_path(voice_name, variant);
        let Some(bytes) = Self::read_file(&path).await? else {
            return Ok(None);
        };

        match decode(bytes)? {
            StoredBlob::Envelope(envelope) => {
                let tagged = ModelVariant::new(envelope.model_variant.clone())
                    .map_err(|e| StoreError::SerializationError(e.to_string()))?;
                if tagged.slug() != variant.slug() || envelope.voice_name != voice_name {
                    tracing::warn!(
                        path = %path.display(),
                        voice = %voice_name,
                        expected_variant = %variant,
                        tagged_variant = %envelope.model_variant,
                        tagged_voice = %envelope.voice_name,
                        "Clone prompt file tag mismatch, ignoring"
                    );
                    return Ok(None);
                }
                Ok(Some(ClonePromptBlob::from(envelope.payload)))
            }
            StoredBlob::Raw(payload) => Ok(Some(ClonePromptBlob::from(payload))),
        }
    }

    async fn write(
        &self,
        voice_name: &str,
        variant: &ModelVariant,
        blob: &ClonePromptBlob,
    ) -> Result<(), StoreError> {
        let envelope = BlobEnvelope {
            magic: MAGIC,
            version: ENVELOPE_VERSION,
            voice_name: voice_name.to_string(),
            model_variant: variant.as_str().to_string(),
            created_at: Utc::now().timestamp(),
            payload: blob.as_bytes().to_vec(),
        };
        let bytes = bincode::serialize(&envelope)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;

        let path = self.model_path(voice_name, variant);
        write_atomic(&path, &bytes)
            .await
            .map_err(|e| StoreError::IoError(e.to_string()))?;

        tracing::debug!(
            path = %path.display(),
            voice = %voice_name,
            model_variant = %variant,
            size = blob.len(),
            "Clone prompt written"
        );
        Ok(())
    }

    async fn read_legacy(&self, voice_name: &str) -> Result<Option<ClonePromptBlob>, StoreError> {
        let path = self.legacy_path(voice_name);
        Ok(Self::read_file(&path).await?.map(ClonePromptBlob::from))
    }

    async fn remove_voice(&self, voice_name: &str) -> Result<usize, StoreError> {
        let mut entries = match fs::read_dir(&self.base_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(StoreError::IoError(e.to_string())),
        };

        let mut removed = 0usize;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::IoError(e.to_string()))?
        {
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().to_string();
            if !self.belongs_to(&path, &file_name, voice_name).await {
                continue;
            }
            fs::remove_file(&path)
                .await
                .map_err(|e| StoreError::IoError(e.to_string()))?;
            removed += 1;
        }

        tracing::info!(voice = %voice_name, files = removed, "Clone prompt files removed");
        Ok(removed)
    }
}
