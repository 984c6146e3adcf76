//! Voice Command Handlers
//!
//! 音色的设计、克隆与删除。旧的 clone prompt 与新定义不再对应，保存前一律清除

use std::sync::Arc;

use crate::application::commands::{CloneVoice, DeleteVoice, DesignVoice};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    ClonePromptCachePort, VoiceAudioStoragePort, VoiceContainerPort, VoiceRepositoryPort,
};
use crate::domain::voice::{VoiceName, VoiceRecord};

/// 支持的参考音频格式
const REFERENCE_EXTENSIONS: &[&str] = &["wav", "mp3", "flac"];

// ============================================================================
// DesignVoice
// ============================================================================

/// DesignVoice Handler
///
/// 只保存记录，设计后端在首次合成时由缓存调用
pub struct DesignVoiceHandler {
    voice_repo: Arc<dyn VoiceRepositoryPort>,
    cache: Arc<dyn ClonePromptCachePort>,
}

impl DesignVoiceHandler {
    pub fn new(voice_repo: Arc<dyn VoiceRepositoryPort>, cache: Arc<dyn ClonePromptCachePort>) -> Self {
        Self { voice_repo, cache }
    }

    pub async fn handle(&self, command: DesignVoice) -> Result<VoiceRecord, ApplicationError> {
        let name = VoiceName::new(command.name)?;
        let description = command.description.trim();
        if description.is_empty() {
            return Err(ApplicationError::validation("voice description cannot be empty"));
        }

        let voice = VoiceRecord::designed(name, description);
        self.cache.evict_voice(voice.name().as_str()).await?;
        self.voice_repo.save(&voice).await?;

        tracing::info!(name = %voice.name(), "Voice designed");
        Ok(voice)
    }
}

// ============================================================================
// CloneVoice
// ============================================================================

/// CloneVoice Handler
pub struct CloneVoiceHandler {
    voice_repo: Arc<dyn VoiceRepositoryPort>,
    storage: Arc<dyn VoiceAudioStoragePort>,
    cache: Arc<dyn ClonePromptCachePort>,
}

impl CloneVoiceHandler {
    pub fn new(
        voice_repo: Arc<dyn VoiceRepositoryPort>,
        storage: Arc<dyn VoiceAudioStoragePort>,
        cache: Arc<dyn ClonePromptCachePort>,
    ) -> Self {
        Self {
            voice_repo,
            storage,
            cache,
        }
    }

    pub async fn handle(&self, command: CloneVoice) -> Result<VoiceRecord, ApplicationError> {
        let name = VoiceName::new(command.name)?;
        let extension = command.extension.trim_start_matches('.').to_lowercase();
        if !REFERENCE_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ApplicationError::validation(format!(
                "unsupported reference audio format: {}",
                command.extension
            )));
        }
        if command.audio_data.is_empty() {
            return Err(ApplicationError::validation("reference audio is empty"));
        }

        let path = self
            .storage
            .save_reference(name.as_str(), &extension, &command.audio_data)
            .await?;
        let description = command
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        let voice = VoiceRecord::cloned(name, path, description);

        self.cache.evict_voice(voice.name().as_str()).await?;
        self.voice_repo.save(&voice).await?;

        tracing::info!(
            name = %voice.name(),
            size = command.audio_data.len(),
            "Voice cloned"
        );
        Ok(voice)
    }
}

// ============================================================================
// DeleteVoice
// ============================================================================

/// 删除结果
#[derive(Debug, Clone)]
pub struct DeleteVoiceResponse {
    /// 索引中是否存在该音色
    pub deleted: bool,
    pub cache_files_removed: usize,
}

/// DeleteVoice Handler
pub struct DeleteVoiceHandler {
    voice_repo: Arc<dyn VoiceRepositoryPort>,
    cache: Arc<dyn ClonePromptCachePort>,
    containers: Arc<dyn VoiceContainerPort>,
}

impl DeleteVoiceHandler {
    pub fn new(
        voice_repo: Arc<dyn VoiceRepositoryPort>,
        cache: Arc<dyn ClonePromptCachePort>,
        containers: Arc<dyn VoiceContainerPort>,
    ) -> Self {
        Self {
            voice_repo,
            cache,
            containers,
        }
    }

    pub async fn handle(&self, command: DeleteVoice) -> Result<DeleteVoiceResponse, ApplicationError> {
        let deleted = self.voice_repo.delete(&command.name).await?;
        let cache_files_removed = self.cache.evict_voice(&command.name).await?;
        if deleted {
            self.containers.remove(&command.name).await?;
        }

        tracing::info!(
            name = %command.name,
            deleted,
            cache_files_removed,
            "Voice deleted"
        );

        Ok(DeleteVoiceResponse {
            deleted,
            cache_files_removed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::voice::{ModelVariant, VoiceKind};
    use crate::infrastructure::adapters::{
        FakeTtsClient, FileVoiceAudioStorage, FileVoiceContainerStore, SymphoniaReferenceLoader,
    };
    use crate::infrastructure::memory::{ClonePromptCache, ClonePromptCacheConfig};
    use crate::infrastructure::persistence::{FileClonePromptStore, JsonVoiceRepository};
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        dir: TempDir,
        repo: Arc<JsonVoiceRepository>,
        cache: Arc<ClonePromptCache>,
        design: DesignVoiceHandler,
        clone: CloneVoiceHandler,
        delete: DeleteVoiceHandler,
    }

    async fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let repo = Arc::new(JsonVoiceRepository::new(root.join("voices.json")));
        let containers = Arc::new(FileVoiceContainerStore::new(root.join("containers")).await.unwrap());
        let storage = Arc::new(FileVoiceAudioStorage::new(root.join("voices")).await.unwrap());
        let cache = Arc::new(ClonePromptCache::new(
            Arc::new(FileClonePromptStore::new(root.join("clone_prompts")).await.unwrap()),
            containers.clone(),
            Arc::new(FakeTtsClient::with_defaults()),
            Arc::new(SymphoniaReferenceLoader::new()),
            ClonePromptCacheConfig {
                legacy_variant: ModelVariant::new("1.7b").unwrap(),
                language: "auto".to_string(),
            },
        ));

        Fixture {
            design: DesignVoiceHandler::new(repo.clone(), cache.clone()),
            clone: CloneVoiceHandler::new(repo.clone(), storage, cache.clone()),
            delete: DeleteVoiceHandler::new(repo.clone(), cache.clone(), containers),
            dir,
            repo,
            cache,
        }
    }

    #[tokio::test]
    async fn test_design_saves_record() {
        let f = fixture().await;
        let voice = f
            .design
            .handle(DesignVoice {
                name: "Ada".to_string(),
                description: "  warm alto  ".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(voice.description(), Some("warm alto"));
        assert_eq!(f.repo.find_by_name("Ada").await.unwrap(), Some(voice));
    }

    #[tokio::test]
    async fn test_design_rejects_bad_input() {
        let f = fixture().await;
        let empty = f
            .design
            .handle(DesignVoice {
                name: "Ada".to_string(),
                description: " ".to_string(),
            })
            .await;
        assert!(matches!(empty, Err(ApplicationError::ValidationError(_))));

        let path = f
            .design
            .handle(DesignVoice {
                name: "../Ada".to_string(),
                description: "x".to_string(),
            })
            .await;
        assert!(matches!(path, Err(ApplicationError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_clone_writes_reference_audio() {
        let f = fixture().await;
        let voice = f
            .clone
            .handle(CloneVoice {
                name: "Bob".to_string(),
                description: None,
                audio_data: b"RIFF....".to_vec(),
                extension: ".WAV".to_string(),
            })
            .await
            .unwrap();

        match voice.kind() {
            VoiceKind::Cloned { reference_audio } => {
                assert_eq!(reference_audio, &f.dir.path().join("voices").join("Bob.wav"));
                assert!(reference_audio.exists());
            }
            other => panic!("unexpected kind: {:?}", other),
        }

        let unsupported = f
            .clone
            .handle(CloneVoice {
                name: "Bob".to_string(),
                description: None,
                audio_data: vec![1],
                extension: "ogg".to_string(),
            })
            .await;
        assert!(matches!(unsupported, Err(ApplicationError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_cache_files() {
        let f = fixture().await;
        f.design
            .handle(DesignVoice {
                name: "Ada".to_string(),
                description: "warm".to_string(),
            })
            .await
            .unwrap();
        let voice = f.repo.find_by_name("Ada").await.unwrap().unwrap();
        f.cache
            .get_or_derive(&voice, &ModelVariant::new("1.7b").unwrap())
            .await
            .unwrap();

        let response = f
            .delete
            .handle(DeleteVoice {
                name: "Ada".to_string(),
            })
            .await
            .unwrap();
        assert!(response.deleted);
        assert_eq!(response.cache_files_removed, 1);
        assert!(f.repo.find_by_name("Ada").await.unwrap().is_none());

        let again = f
            .delete
            .handle(DeleteVoice {
                name: "Ada".to_string(),
            })
            .await
            .unwrap();
        assert!(!again.deleted);
    }
}
