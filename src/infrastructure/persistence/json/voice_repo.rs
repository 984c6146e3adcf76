//! JSON Voice Repository
//!
//! 音色索引：`voices.json` 中的有序 JSON 数组，按 name 覆盖保存

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::application::ports::{RepositoryError, VoiceRepositoryPort};
use crate::domain::voice::VoiceRecord;
use crate::infrastructure::persistence::files::write_atomic;

/// JSON 音色仓储
///
/// 所有读-改-写都经过同一把互斥锁，保证同一时刻只有一个写者
pub struct JsonVoiceRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonVoiceRepository {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Vec<VoiceRecord>, RepositoryError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RepositoryError::IoError(e.to_string())),
        };
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes).map_err(|e| RepositoryError::SerializationError(e.to_string()))
    }

    async fn persist(&self, voices: &[VoiceRecord]) -> Result<(), RepositoryError> {
        let json = serde_json::to_vec_pretty(voices)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        write_atomic(&self.path, &json)
            .await
            .map_err(|e| RepositoryError::IoError(e.to_string()))
    }
}

#[async_trait]
impl VoiceRepositoryPort for JsonVoiceRepository {
    async fn save(&self, voice: &VoiceRecord) -> Result<(), RepositoryError> {
        let _guard = self.lock.lock().await;
        let mut voices = self.load().await?;

        match voices.iter_mut().find(|v| v.name() == voice.name()) {
            Some(existing) => *existing = voice.clone(),
            None => voices.push(voice.clone()),
        }

        self.persist(&voices).await?;
        tracing::debug!(voice = %voice.name(), total = voices.len(), "Voice index saved");
        Ok(())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<VoiceRecord>, RepositoryError> {
        let _guard = self.lock.lock().await;
        Ok(self
            .load()
            .await?
            .into_iter()
            .find(|v| v.name().as_str() == name))
    }

    async fn find_all(&self) -> Result<Vec<VoiceRecord>, RepositoryError> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn delete(&self, name: &str) -> Result<bool, RepositoryError> {
        let _guard = self.lock.lock().await;
        let mut voices = self.load().await?;
        let before = voices.len();
        voices.retain(|v| v.name().as_str() != name);

        if voices.len() == before {
            return Ok(false);
        }
        self.persist(&voices).await?;
        Ok(true)
    }
}
