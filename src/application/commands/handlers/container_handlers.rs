//! Container Command Handlers - 音色归档导出/导入

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::commands::handlers::SynthesisSettings;
use crate::application::commands::{ExportVoice, ImportVoice};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    ClonePromptCachePort, VoiceAudioStoragePort, VoiceContainerPort, VoiceRepositoryPort,
};
use crate::application::queries::handlers::GetVoiceHandler;
use crate::domain::container::{ContainerManifest, ProvenanceMethod};
use crate::domain::voice::{VoiceKind, VoiceName, VoiceRecord};

/// 导入时样本音频的落盘文件名
const IMPORTED_SAMPLE_FILE: &str = "embedded-sample.wav";

/// 导出结果
#[derive(Debug, Clone)]
pub struct ExportVoiceResponse {
    pub name: String,
    pub model_variant: String,
    /// `.voice` 归档字节
    pub archive_data: Vec<u8>,
}

/// 导入结果
#[derive(Debug, Clone)]
pub struct ImportVoiceResponse {
    pub name: String,
    pub kind: &'static str,
    pub supported_model_variants: Vec<String>,
    /// 是否用归档中的 clone prompt 预热了缓存
    pub clone_prompt_seeded: bool,
}

// ============================================================================
// ExportVoice
// ============================================================================

/// ExportVoice Handler
pub struct ExportVoiceHandler {
    voices: Arc<GetVoiceHandler>,
    cache: Arc<dyn ClonePromptCachePort>,
    containers: Arc<dyn VoiceContainerPort>,
    storage: Arc<dyn VoiceAudioStoragePort>,
    settings: SynthesisSettings,
}

impl ExportVoiceHandler {
    pub fn new(
        voices: Arc<GetVoiceHandler>,
        cache: Arc<dyn ClonePromptCachePort>,
        containers: Arc<dyn VoiceContainerPort>,
        storage: Arc<dyn VoiceAudioStoragePort>,
        settings: SynthesisSettings,
    ) -> Self {
        Self {
            voices,
            cache,
            containers,
            storage,
            settings,
        }
    }

    pub async fn handle(&self, command: ExportVoice) -> Result<ExportVoiceResponse, ApplicationError> {
        let voice = self.voices.resolve(Some(&command.name)).await?;
        if !voice.kind().uses_clone_prompt() {
            return Err(ApplicationError::validation(format!(
                "preset speaker '{}' has no clone prompt to export",
                voice.name()
            )));
        }

        let variant = self
            .settings
            .variant_or_default(command.model_variant.as_deref())?;
        let blob = self.cache.get_or_derive(&voice, &variant).await?;

        let mut references = Vec::new();
        if let VoiceKind::Cloned { reference_audio } = voice.kind() {
            let data = self.storage.read(reference_audio).await?;
            references.push((file_name_of(reference_audio), data));
        }

        // 沿用已有归档中的样本音频
        let sample_audio = match self.containers.locate(voice.name().as_str()).await {
            Some(path) => match self.containers.load(&path, &variant).await {
                Ok(existing) => existing.sample_audio,
                Err(e) => {
                    tracing::warn!(voice = %voice.name(), error = %e, "Ignoring unreadable container");
                    None
                }
            },
            None => None,
        };

        let manifest = ContainerManifest::new(
            voice.name().as_str(),
            voice.description().map(str::to_string),
            ProvenanceMethod::from_kind(voice.kind()),
            self.settings.engine_name.clone(),
        );
        let archive_data = self
            .containers
            .export(
                &manifest,
                Some((&variant, &blob)),
                sample_audio.as_deref(),
                &references,
            )
            .await?;
        let path = self
            .containers
            .store(voice.name().as_str(), &archive_data)
            .await?;

        tracing::info!(
            voice = %voice.name(),
            model_variant = %variant,
            path = %path.display(),
            size = archive_data.len(),
            "Voice exported"
        );

        Ok(ExportVoiceResponse {
            name: voice.name().to_string(),
            model_variant: variant.to_string(),
            archive_data,
        })
    }
}

fn file_name_of(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "reference.wav".to_string())
}

// ============================================================================
// ImportVoice
// ============================================================================

/// ImportVoice Handler
pub struct ImportVoiceHandler {
    voice_repo: Arc<dyn VoiceRepositoryPort>,
    cache: Arc<dyn ClonePromptCachePort>,
    containers: Arc<dyn VoiceContainerPort>,
    storage: Arc<dyn VoiceAudioStoragePort>,
    settings: SynthesisSettings,
}

impl ImportVoiceHandler {
    pub fn new(
        voice_repo: Arc<dyn VoiceRepositoryPort>,
        cache: Arc<dyn ClonePromptCachePort>,
        containers: Arc<dyn VoiceContainerPort>,
        storage: Arc<dyn VoiceAudioStoragePort>,
        settings: SynthesisSettings,
    ) -> Self {
        Self {
            voice_repo,
            cache,
            containers,
            storage,
            settings,
        }
    }

    /// 先完整解析归档，解析失败时不产生任何副作用
    pub async fn handle(&self, command: ImportVoice) -> Result<ImportVoiceResponse, ApplicationError> {
        let variant = self
            .settings
            .variant_or_default(command.model_variant.as_deref())?;
        let imported = self
            .containers
            .import(&command.archive_data, &variant)
            .await?;

        let name = VoiceName::new(imported.name())
            .map_err(|e| ApplicationError::ContainerImportFailed(e.to_string()))?;
        let method = imported.provenance_method();
        if method == ProvenanceMethod::PresetSpeaker {
            return Err(ApplicationError::ContainerImportFailed(
                "preset speaker archives cannot be imported".to_string(),
            ));
        }
        if method == ProvenanceMethod::VoiceClone
            && imported.reference_audio.is_empty()
            && imported.sample_audio.is_none()
        {
            return Err(ApplicationError::ContainerImportFailed(format!(
                "cloned voice '{}' carries no audio",
                name
            )));
        }

        let mut reference_paths: Vec<PathBuf> = Vec::new();
        for (file_name, data) in &imported.reference_audio {
            let base = file_name.rsplit('/').next().unwrap_or(file_name);
            let path = self
                .storage
                .save_imported(name.as_str(), base, data)
                .await?;
            reference_paths.push(path);
        }
        let sample_path = match &imported.sample_audio {
            Some(sample) => Some(
                self.storage
                    .save_imported(name.as_str(), IMPORTED_SAMPLE_FILE, sample)
                    .await?,
            ),
            None => None,
        };

        let description = imported.description().map(str::to_string);
        let kind = match method {
            ProvenanceMethod::VoiceClone => VoiceKind::Cloned {
                reference_audio: reference_paths
                    .into_iter()
                    .next()
                    .or(sample_path)
                    .ok_or_else(|| ApplicationError::internal("cloned voice without audio"))?,
            },
            ProvenanceMethod::VoiceDesign | ProvenanceMethod::Builtin => VoiceKind::Designed,
            ProvenanceMethod::PresetSpeaker => {
                return Err(ApplicationError::internal("unreachable provenance"))
            }
        };
        // 设计音色冷推导需要描述
        let description = match kind {
            VoiceKind::Designed => Some(description.unwrap_or_else(|| name.to_string())),
            _ => description,
        };

        let voice = VoiceRecord::new(name, kind, description)
            .with_created_at(imported.manifest.created_at);
        self.cache.evict_voice(voice.name().as_str()).await?;
        self.voice_repo.save(&voice).await?;

        let clone_prompt_seeded = match &imported.clone_prompt {
            Some(blob) => {
                self.cache
                    .seed(voice.name().as_str(), &variant, blob.clone())
                    .await;
                true
            }
            None => false,
        };
        self.containers
            .store(voice.name().as_str(), &command.archive_data)
            .await?;

        tracing::info!(
            voice = %voice.name(),
            kind = voice.kind().as_str(),
            variants = ?imported.supported_model_variants,
            clone_prompt_seeded,
            "Voice imported"
        );

        Ok(ImportVoiceResponse {
            name: voice.name().to_string(),
            kind: voice.kind().as_str(),
            supported_model_variants: imported.supported_model_variants,
            clone_prompt_seeded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::handlers::SynthesizeHandler;
    use crate::application::commands::SynthesizeSpeech;
    use crate::domain::pcm;
    use crate::domain::voice::{builtin_voices, ClonePromptBlob, ModelVariant};
    use crate::infrastructure::adapters::{
        FakeTtsClient, FileVoiceAudioStorage, FileVoiceContainerStore, SymphoniaReferenceLoader,
    };
    use crate::infrastructure::memory::{ClonePromptCache, ClonePromptCacheConfig};
    use crate::infrastructure::persistence::{FileClonePromptStore, JsonVoiceRepository};
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    fn settings() -> SynthesisSettings {
        SynthesisSettings {
            language: "auto".to_string(),
            model_variant: ModelVariant::new("1.7b").unwrap(),
            max_words: 200,
            sample_rate: 24000,
            engine_name: "qwen3-tts".to_string(),
        }
    }

    /// 一个独立的数据目录
    struct Node {
        dir: TempDir,
        repo: Arc<JsonVoiceRepository>,
        engine: Arc<FakeTtsClient>,
        containers: Arc<FileVoiceContainerStore>,
        export: ExportVoiceHandler,
        import: ImportVoiceHandler,
        synth: SynthesizeHandler,
    }

    async fn node() -> Node {
        let dir = tempdir().unwrap();
        let root: &Path = dir.path();
        let repo = Arc::new(JsonVoiceRepository::new(root.join("voices.json")));
        let containers = Arc::new(FileVoiceContainerStore::new(root.join("containers")).await.unwrap());
        let storage = Arc::new(FileVoiceAudioStorage::new(root.join("voices")).await.unwrap());
        let engine = Arc::new(FakeTtsClient::with_defaults());
        let cache = Arc::new(ClonePromptCache::new(
            Arc::new(FileClonePromptStore::new(root.join("clone_prompts")).await.unwrap()),
            containers.clone(),
            engine.clone(),
            Arc::new(SymphoniaReferenceLoader::new()),
            ClonePromptCacheConfig {
                legacy_variant: ModelVariant::new("1.7b").unwrap(),
                language: "auto".to_string(),
            },
        ));
        let voices = Arc::new(GetVoiceHandler::new(repo.clone(), Arc::new(builtin_voices())));

        Node {
            export: ExportVoiceHandler::new(
                voices.clone(),
                cache.clone(),
                containers.clone(),
                storage.clone(),
                settings(),
            ),
            import: ImportVoiceHandler::new(
                repo.clone(),
                cache.clone(),
                containers.clone(),
                storage,
                settings(),
            ),
            synth: SynthesizeHandler::new(voices, cache, engine.clone(), settings()),
            dir,
            repo,
            engine,
            containers,
        }
    }

    fn wav(samples: usize) -> Vec<u8> {
        pcm::build(&vec![100i16; samples], 24000)
    }

    #[tokio::test]
    async fn test_export_then_import_cloned_voice() {
        let a = node().await;
        let reference = a.dir.path().join("source.wav");
        tokio::fs::write(&reference, wav(480)).await.unwrap();
        a.repo
            .save(&VoiceRecord::cloned(
                VoiceName::new("Ada").unwrap(),
                reference,
                Some("soft".to_string()),
            ))
            .await
            .unwrap();

        let exported = a
            .export
            .handle(ExportVoice {
                name: "Ada".to_string(),
                model_variant: None,
            })
            .await
            .unwrap();
        assert_eq!(exported.model_variant, "1.7b");
        assert!(a.containers.locate("Ada").await.is_some());

        let b = node().await;
        let imported = b
            .import
            .handle(ImportVoice {
                archive_data: exported.archive_data,
                model_variant: None,
            })
            .await
            .unwrap();
        assert_eq!(imported.kind, "cloned");
        assert_eq!(imported.supported_model_variants, vec!["1.7b".to_string()]);
        assert!(imported.clone_prompt_seeded);

        let voice = b.repo.find_by_name("Ada").await.unwrap().unwrap();
        assert_eq!(voice.description(), Some("soft"));
        match voice.kind() {
            VoiceKind::Cloned { reference_audio } => {
                assert!(reference_audio.ends_with("Ada/source.wav"));
            }
            other => panic!("unexpected kind: {:?}", other),
        }

        // 预热后合成不需要任何推导
        b.synth
            .handle(SynthesizeSpeech {
                text: "Hello there.".to_string(),
                voice_name: Some("Ada".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(b.engine.extract_calls(), 0);
        assert_eq!(b.engine.design_calls(), 0);
        assert_eq!(b.engine.synth_calls(), 1);
    }

    #[tokio::test]
    async fn test_export_preset_speaker_rejected() {
        let a = node().await;
        let result = a
            .export
            .handle(ExportVoice {
                name: "vivian".to_string(),
                model_variant: None,
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_import_garbage_has_no_side_effects() {
        let b = node().await;
        let result = b
            .import
            .handle(ImportVoice {
                archive_data: b"definitely not a zip".to_vec(),
                model_variant: None,
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::ContainerImportFailed(_))));
        assert!(b.repo.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_designed_voice_without_prompt_for_variant() {
        let b = node().await;
        let manifest = ContainerManifest::new(
            "Bard",
            Some("bright tenor".to_string()),
            ProvenanceMethod::VoiceDesign,
            "qwen3-tts",
        );
        let other = ModelVariant::new("0.6b").unwrap();
        let archive = b
            .containers
            .export(
                &manifest,
                Some((&other, &ClonePromptBlob::from(vec![7u8; 8]))),
                Some(&wav(240)),
                &[],
            )
            .await
            .unwrap();

        let imported = b
            .import
            .handle(ImportVoice {
                archive_data: archive,
                model_variant: None,
            })
            .await
            .unwrap();
        assert_eq!(imported.kind, "designed");
        assert!(!imported.clone_prompt_seeded);
        assert_eq!(imported.supported_model_variants, vec!["0.6b".to_string()]);

        // 1.7b 从归档样本音频提取，不调用设计后端
        b.synth
            .handle(SynthesizeSpeech {
                text: "Hello.".to_string(),
                voice_name: Some("Bard".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(b.engine.design_calls(), 0);
        assert_eq!(b.engine.extract_calls(), 1);
    }
}
