//! File Storage - 文件系统音色音频存储实现
//!
//! 实现 VoiceAudioStoragePort trait

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{AudioStorageError, VoiceAudioStoragePort};
use crate::infrastructure::persistence::files::write_atomic;

/// 只接受单层文件名
fn plain_file_name(name: &str) -> Result<&str, AudioStorageError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\');
    if invalid {
        return Err(AudioStorageError::InvalidName(name.to_string()));
    }
    Ok(name)
}

/// 文件系统音色音频存储
pub struct FileVoiceAudioStorage {
    /// 存储根目录
    base_dir: PathBuf,
}

impl FileVoiceAudioStorage {
    /// 创建新的文件存储
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self, AudioStorageError> {
        let base_dir = base_dir.as_ref().to_path_buf();

        // 确保目录存在
        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| AudioStorageError::IoError(e.to_string()))?;

        Ok(Self { base_dir })
    }

    async fn save(&self, path: PathBuf, data: &[u8]) -> Result<PathBuf, AudioStorageError> {
        write_atomic(&path, data)
            .await
            .map_err(|e| AudioStorageError::IoError(e.to_string()))?;

        tracing::debug!(path = %path.display(), size = data.len(), "Saved voice audio");
        Ok(path)
    }
}

#[async_trait]
impl VoiceAudioStoragePort for FileVoiceAudioStorage {
    async fn save_reference(
        &self,
        voice_name: &str,
        extension: &str,
        data: &[u8],
    ) -> Result<PathBuf, AudioStorageError> {
        let file_name = format!("{}.{}", plain_file_name(voice_name)?, plain_file_name(extension)?);
        self.save(self.base_dir.join(file_name), data).await
    }

    async fn save_imported(
        &self,
        voice_name: &str,
        file_name: &str,
        data: &[u8],
    ) -> Result<PathBuf, AudioStorageError> {
        let path = self
            .base_dir
            .join(plain_file_name(voice_name)?)
            .join(plain_file_name(file_name)?);
        self.save(path, data).await
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>, AudioStorageError> {
        match fs::read(path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                AudioStorageError::FileNotFound(path.to_string_lossy().to_string()),
            ),
            Err(e) => Err(AudioStorageError::IoError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_save_and_read() {
        let dir = tempdir().unwrap();
        let storage = FileVoiceAudioStorage::new(dir.path()).await.unwrap();

        let path = storage.save_reference("Ada", "wav", b"audio").await.unwrap();
        assert_eq!(path, dir.path().join("Ada.wav"));
        assert_eq!(storage.read(&path).await.unwrap(), b"audio");

        let imported = storage
            .save_imported("Ada", "sample-audio.wav", b"sample")
            .await
            .unwrap();
        assert_eq!(imported, dir.path().join("Ada").join("sample-audio.wav"));
    }

    #[tokio::test]
    async fn test_rejects_path_like_names() {
        let dir = tempdir().unwrap();
        let storage = FileVoiceAudioStorage::new(dir.path()).await.unwrap();

        assert!(matches!(
            storage.save_imported("Ada", "../escape.wav", b"x").await,
            Err(AudioStorageError::InvalidName(_))
        ));
        assert!(matches!(
            storage.read(&dir.path().join("none.wav")).await,
            Err(AudioStorageError::FileNotFound(_))
        ));
    }
}
