//! File Voice Container Store
//!
//! 实现 VoiceContainerPort：归档文件位于 `<dir>/<voice>.voice`，
//! 所有改写都是整文件原子替换。ZIP 压缩/解压在阻塞线程池中执行

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use super::archive;
use crate::application::ports::{ContainerError, ImportedVoice, VoiceContainerPort};
use crate::domain::container::ContainerManifest;
use crate::domain::voice::{ClonePromptBlob, ModelVariant};
use crate::infrastructure::persistence::files::write_atomic;

const CONTAINER_EXTENSION: &str = "voice";

/// 文件系统归档存储
pub struct FileVoiceContainerStore {
    base_dir: PathBuf,
    /// 串行化读-改-写，避免两个变体的更新互相覆盖
    update_lock: Mutex<()>,
}

impl FileVoiceContainerStore {
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self, ContainerError> {
        let base_dir = base_dir.as_ref().to_path_buf();

        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| ContainerError::IoError(e.to_string()))?;

        Ok(Self {
            base_dir,
            update_lock: Mutex::new(()),
        })
    }

    pub fn container_path(&self, voice_name: &str) -> PathBuf {
        self.base_dir
            .join(format!("{}.{}", voice_name, CONTAINER_EXTENSION))
    }

    async fn rewrite<F>(&self, path: &Path, update: F) -> Result<(), ContainerError>
    where
        F: FnOnce(&[u8]) -> Result<Vec<u8>, ContainerError> + Send + 'static,
    {
        let _guard = self.update_lock.lock().await;
        let bytes = fs::read(path)
            .await
            .map_err(|e| ContainerError::UpdateFailed(format!("{}: {}", path.display(), e)))?;
        let updated = blocking(move || update(&bytes)).await?;
        write_atomic(path, &updated)
            .await
            .map_err(|e| ContainerError::UpdateFailed(format!("{}: {}", path.display(), e)))
    }
}

/// 在阻塞线程池中执行归档编解码
async fn blocking<T, F>(task: F) -> Result<T, ContainerError>
where
    F: FnOnce() -> Result<T, ContainerError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ContainerError::IoError(format!("archive task aborted: {}", e)))?
}

#[async_trait]
impl VoiceContainerPort for FileVoiceContainerStore {
    async fn export(
        &self,
        manifest: &ContainerManifest,
        clone_prompt: Option<(&ModelVariant, &ClonePromptBlob)>,
        sample_audio: Option<&[u8]>,
        reference_audio: &[(String, Vec<u8>)],
    ) -> Result<Vec<u8>, ContainerError> {
        let manifest = manifest.clone();
        let clone_prompt = clone_prompt.map(|(variant, blob)| (variant.clone(), blob.clone()));
        let sample_audio = sample_audio.map(<[u8]>::to_vec);
        let reference_audio = reference_audio.to_vec();
        blocking(move || {
            archive::export_archive(
                &manifest,
                clone_prompt.as_ref().map(|(variant, blob)| (variant, blob)),
                sample_audio.as_deref(),
                &reference_audio,
            )
        })
        .await
    }

    async fn import(
        &self,
        bytes: &[u8],
        variant: &ModelVariant,
    ) -> Result<ImportedVoice, ContainerError> {
        let bytes = bytes.to_vec();
        let variant = variant.clone();
        blocking(move || archive::import_archive(&bytes, &variant)).await
    }

    async fn locate(&self, voice_name: &str) -> Option<PathBuf> {
        let path = self.container_path(voice_name);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Some(path),
            _ => None,
        }
    }

    async fn load(
        &self,
        path: &Path,
        variant: &ModelVariant,
    ) -> Result<ImportedVoice, ContainerError> {
        let bytes = fs::read(path)
            .await
            .map_err(|e| ContainerError::ImportFailed(format!("{}: {}", path.display(), e)))?;
        let variant = variant.clone();
        blocking(move || archive::import_archive(&bytes, &variant)).await
    }

    async fn store(&self, voice_name: &str, bytes: &[u8]) -> Result<PathBuf, ContainerError> {
        let path = self.container_path(voice_name);
        let _guard = self.update_lock.lock().await;
        write_atomic(&path, bytes)
            .await
            .map_err(|e| ContainerError::IoError(e.to_string()))?;

        tracing::info!(voice = %voice_name, path = %path.display(), size = bytes.len(), "Container stored");
        Ok(path)
    }

    async fn update_clone_prompt(
        &self,
        path: &Path,
        blob: &ClonePromptBlob,
        variant: &ModelVariant,
    ) -> Result<(), ContainerError> {
        let (owned_blob, owned_variant) = (blob.clone(), variant.clone());
        self.rewrite(path, move |bytes| {
            archive::replace_clone_prompt(bytes, &owned_blob, &owned_variant)
        })
        .await?;
        tracing::debug!(path = %path.display(), model_variant = %variant, "Container clone prompt updated");
        Ok(())
    }

    async fn update_sample_audio(&self, path: &Path, sample: &[u8]) -> Result<(), ContainerError> {
        let owned_sample = sample.to_vec();
        self.rewrite(path, move |bytes| archive::replace_sample_audio(bytes, &owned_sample))
            .await?;
        tracing::debug!(path = %path.display(), size = sample.len(), "Container sample audio updated");
        Ok(())
    }

    async fn remove(&self, voice_name: &str) -> Result<bool, ContainerError> {
        let _guard = self.update_lock.lock().await;
        match fs::remove_file(self.container_path(voice_name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ContainerError::IoError(e.to_string())),
        }
    }
}
