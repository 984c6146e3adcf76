//! Clone Prompt Cache - 分层 clone prompt 缓存实现
//!
//! 层级（命中即止）：
//! 1. 内存 DashMap
//! 2. `<voice>-<slug>.blob`，命中后同步到归档
//! 3. `<voice>.blob`，仅属于 legacy 变体，命中后迁移为 2
//! 4. 归档：已有该变体的 prompt 直接使用；否则取样本音频或参考音频，规范化后重新提取
//! 5. 冷推导：克隆音色读参考音频，设计音色先调用设计后端
//!
//! 同一键的推导通过锁表串行化，不同键互不阻塞。
//! 每个音色另有一把读写闸门：推导持读锁，清除持写锁，
//! 清除因此会等待进行中的推导结束，推导结果不会在清除后写回

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::application::error::ApplicationError;
use crate::application::ports::{
    CacheError, CacheTier, ClonePromptCachePort, ClonePromptCacheStats, ClonePromptRequest,
    ClonePromptStorePort, DesignRequest, ReferenceAudioPort, TtsEnginePort, VoiceContainerPort,
};
use crate::domain::voice::{CacheKey, ClonePromptBlob, ModelVariant, VoiceKind, VoiceRecord};

/// 缓存配置
#[derive(Debug, Clone)]
pub struct ClonePromptCacheConfig {
    /// 旧格式文件所属的变体
    pub legacy_variant: ModelVariant,
    /// 设计后端使用的语言
    pub language: String,
}

#[derive(Default)]
struct TierCounters {
    memory_hits: AtomicU64,
    model_disk_hits: AtomicU64,
    legacy_disk_hits: AtomicU64,
    container_extractions: AtomicU64,
    cold_derivations: AtomicU64,
}

impl TierCounters {
    fn record(&self, tier: CacheTier) {
        let counter = match tier {
            CacheTier::Memory => &self.memory_hits,
            CacheTier::ModelDisk => &self.model_disk_hits,
            CacheTier::LegacyDisk => &self.legacy_disk_hits,
            CacheTier::Container => &self.container_extractions,
            CacheTier::ColdDerivation => &self.cold_derivations,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// 分层 clone prompt 缓存
pub struct ClonePromptCache {
    memory: DashMap<CacheKey, ClonePromptBlob>,
    locks: DashMap<CacheKey, Arc<Mutex<()>>>,
    gates: DashMap<String, Arc<RwLock<()>>>,
    store: Arc<dyn ClonePromptStorePort>,
    containers: Arc<dyn VoiceContainerPort>,
    engine: Arc<dyn TtsEnginePort>,
    reference_audio: Arc<dyn ReferenceAudioPort>,
    config: ClonePromptCacheConfig,
    counters: TierCounters,
}

/// 尽力写入失败只记录告警
fn warn_write(voice: &str, variant: &ModelVariant, detail: String) {
    let warning = ApplicationError::CacheWriteWarning(detail);
    tracing::warn!(voice = %voice, model_variant = %variant, "{}", warning);
}

impl ClonePromptCache {
    pub fn new(
        store: Arc<dyn ClonePromptStorePort>,
        containers: Arc<dyn VoiceContainerPort>,
        engine: Arc<dyn TtsEnginePort>,
        reference_audio: Arc<dyn ReferenceAudioPort>,
        config: ClonePromptCacheConfig,
    ) -> Self {
        Self {
            memory: DashMap::new(),
            locks: DashMap::new(),
            gates: DashMap::new(),
            store,
            containers,
            engine,
            reference_audio,
            config,
            counters: TierCounters::default(),
        }
    }

    fn memory_get(&self, key: &CacheKey) -> Option<ClonePromptBlob> {
        self.memory.get(key).map(|entry| entry.value().clone())
    }

    fn key_lock(&self, key: &CacheKey) -> Arc<Mutex<()>> {
        self.locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn release_key_lock(&self, key: &CacheKey) {
        self.locks.remove_if(key, |_, l| Arc::strong_count(l) <= 2);
    }

    fn voice_gate(&self, voice: &str) -> Arc<RwLock<()>> {
        self.gates
            .entry(voice.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    /// 调用方仍持有自己的 Arc，计数 <= 2 说明没有其它等待者
    fn release_gate(&self, voice: &str) {
        self.gates.remove_if(voice, |_, g| Arc::strong_count(g) <= 2);
    }

    async fn persist(&self, voice: &str, variant: &ModelVariant, blob: &ClonePromptBlob) {
        if let Err(e) = self.store.write(voice, variant, blob).await {
            warn_write(voice, variant, format!("clone prompt file write failed: {}", e));
        }
    }

    /// 归档存在时写入该变体的 clone prompt
    async fn sync_container(&self, voice: &str, variant: &ModelVariant, blob: &ClonePromptBlob) {
        let Some(path) = self.containers.locate(voice).await else {
            return;
        };
        if let Err(e) = self
            .containers
            .update_clone_prompt(&path, blob, variant)
            .await
        {
            warn_write(voice, variant, format!("container update failed: {}", e));
        }
    }

    async fn sync_container_sample(&self, voice: &str, variant: &ModelVariant, sample: &[u8]) {
        let Some(path) = self.containers.locate(voice).await else {
            return;
        };
        if let Err(e) = self.containers.update_sample_audio(&path, sample).await {
            warn_write(voice, variant, format!("container sample update failed: {}", e));
        }
    }

    fn is_legacy_variant(&self, variant: &ModelVariant) -> bool {
        variant.slug() == self.config.legacy_variant.slug()
    }

    /// 第 2、3 层
    async fn from_disk(
        &self,
        voice: &str,
        variant: &ModelVariant,
    ) -> Option<(ClonePromptBlob, CacheTier)> {
        match self.store.read(voice, variant).await {
            Ok(Some(blob)) => {
                self.sync_container(voice, variant, &blob).await;
                return Some((blob, CacheTier::ModelDisk));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(voice = %voice, model_variant = %variant, error = %e, "Clone prompt file unreadable");
            }
        }

        if !self.is_legacy_variant(variant) {
            return None;
        }
        match self.store.read_legacy(voice).await {
            Ok(Some(blob)) => {
                tracing::info!(voice = %voice, model_variant = %variant, "Migrating legacy clone prompt file");
                self.persist(voice, variant, &blob).await;
                self.sync_container(voice, variant, &blob).await;
                Some((blob, CacheTier::LegacyDisk))
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(voice = %voice, error = %e, "Legacy clone prompt file unreadable");
                None
            }
        }
    }

    /// 第 4 层：失败只记录并落到第 5 层
    async fn from_container(
        &self,
        voice: &VoiceRecord,
        variant: &ModelVariant,
    ) -> Option<ClonePromptBlob> {
        let name = voice.name().as_str();
        let path = self.containers.locate(name).await?;

        let imported = match self.containers.load(&path, variant).await {
            Ok(imported) => imported,
            Err(e) => {
                tracing::warn!(voice = %name, path = %path.display(), error = %e, "Container unreadable, skipping");
                return None;
            }
        };

        // 归档已携带该变体的 clone prompt
        if let Some(blob) = imported.clone_prompt {
            self.persist(name, variant, &blob).await;
            return Some(blob);
        }

        let (source, extension) = match imported.sample_audio {
            Some(sample) => (sample, Some("wav".to_string())),
            None => {
                let (file_name, data) = imported.reference_audio.into_iter().next()?;
                let extension = file_name.rsplit_once('.').map(|(_, ext)| ext.to_string());
                (data, extension)
            }
        };
        let source = match self
            .reference_audio
            .normalize(source, extension.as_deref())
            .await
        {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!(voice = %name, error = %e, "Container audio unusable, skipping");
                return None;
            }
        };

        let request = ClonePromptRequest {
            sample_audio: source,
            description: voice.description().map(str::to_string),
            model_variant: variant.clone(),
        };
        match self.engine.extract_clone_prompt(request).await {
            Ok(blob) => {
                self.persist(name, variant, &blob).await;
                Some(blob)
            }
            Err(e) => {
                tracing::warn!(voice = %name, model_variant = %variant, error = %e, "Container re-extraction failed");
                None
            }
        }
    }

    /// 第 5 层：失败即整个查找失败
    async fn cold_derive(
        &self,
        voice: &VoiceRecord,
        variant: &ModelVariant,
    ) -> Result<ClonePromptBlob, CacheError> {
        let name = voice.name().as_str();
        let fail = |detail: String| CacheError::CloneExtractionFailed {
            voice: name.to_string(),
            detail,
        };

        let (sample, designed) = match voice.kind() {
            VoiceKind::Cloned { reference_audio } => {
                let audio = self
                    .reference_audio
                    .load(reference_audio)
                    .await
                    .map_err(|e| fail(e.to_string()))?;
                (audio, false)
            }
            VoiceKind::Designed | VoiceKind::Builtin => {
                let description = voice
                    .description()
                    .ok_or_else(|| fail("voice has no design description".to_string()))?;
                let audio = self
                    .engine
                    .design_voice(DesignRequest {
                        description: description.to_string(),
                        language: self.config.language.clone(),
                    })
                    .await
                    .map_err(|e| fail(format!("voice design failed: {}", e)))?;
                (audio, true)
            }
            VoiceKind::PresetSpeaker { .. } => {
                return Err(fail("preset speakers have no clone prompt".to_string()));
            }
        };

        let request = ClonePromptRequest {
            sample_audio: sample,
            description: voice.description().map(str::to_string),
            model_variant: variant.clone(),
        };
        // 设计样本稍后写入归档，提取前先保留一份
        let sample = designed.then(|| request.sample_audio.clone());
        let blob = self
            .engine
            .extract_clone_prompt(request)
            .await
            .map_err(|e| fail(e.to_string()))?;

        self.persist(name, variant, &blob).await;
        self.sync_container(name, variant, &blob).await;
        if let Some(sample) = sample {
            self.sync_container_sample(name, variant, &sample).await;
        }
        Ok(blob)
    }

    async fn resolve(
        &self,
        voice: &VoiceRecord,
        variant: &ModelVariant,
    ) -> Result<(ClonePromptBlob, CacheTier), CacheError> {
        if let Some(found) = self.from_disk(voice.name().as_str(), variant).await {
            return Ok(found);
        }
        if let Some(blob) = self.from_container(voice, variant).await {
            return Ok((blob, CacheTier::Container));
        }
        let blob = self.cold_derive(voice, variant).await?;
        Ok((blob, CacheTier::ColdDerivation))
    }
}

#[async_trait]
impl ClonePromptCachePort for ClonePromptCache {
    async fn get_or_derive(
        &self,
        voice: &VoiceRecord,
        variant: &ModelVariant,
    ) -> Result<ClonePromptBlob, CacheError> {
        let key = CacheKey::new(voice.name().as_str(), variant);
        if let Some(blob) = self.memory_get(&key) {
            self.counters.record(CacheTier::Memory);
            tracing::debug!(key = %key, tier = CacheTier::Memory.as_str(), "Clone prompt cache hit");
            return Ok(blob);
        }

        let gate = self.voice_gate(&key.voice_name);
        let shared = gate.read().await;
        let lock = self.key_lock(&key);
        let guard = lock.lock().await;

        // 等待期间可能已由其它调用方推导完成
        let result = match self.memory_get(&key) {
            Some(blob) => {
                tracing::debug!(key = %key, tier = CacheTier::Memory.as_str(), "Clone prompt served after wait");
                Ok((blob, CacheTier::Memory))
            }
            None => self.resolve(voice, variant).await,
        };
        if let Ok((blob, tier)) = &result {
            if *tier != CacheTier::Memory {
                self.memory.insert(key.clone(), blob.clone());
                tracing::debug!(key = %key, tier = tier.as_str(), size = blob.len(), "Clone prompt resolved");
            }
            self.counters.record(*tier);
        }

        drop(guard);
        self.release_key_lock(&key);
        drop(shared);
        self.release_gate(&key.voice_name);

        result.map(|(blob, _)| blob)
    }

    async fn seed(&self, voice_name: &str, variant: &ModelVariant, blob: ClonePromptBlob) {
        let key = CacheKey::new(voice_name, variant);
        let gate = self.voice_gate(voice_name);
        let shared = gate.read().await;
        let lock = self.key_lock(&key);
        let guard = lock.lock().await;

        self.persist(voice_name, variant, &blob).await;
        self.memory.insert(key.clone(), blob);

        drop(guard);
        self.release_key_lock(&key);
        drop(shared);
        self.release_gate(voice_name);
    }

    async fn evict_voice(&self, voice_name: &str) -> Result<usize, CacheError> {
        let gate = self.voice_gate(voice_name);
        let exclusive = gate.write().await;

        self.memory.retain(|key, _| key.voice_name != voice_name);
        let removed = self
            .store
            .remove_voice(voice_name)
            .await
            .map_err(|e| CacheError::StorageError(e.to_string()));

        drop(exclusive);
        self.release_gate(voice_name);

        let removed = removed?;
        tracing::debug!(voice = %voice_name, files = removed, "Clone prompt cache evicted");
        Ok(removed)
    }

    fn stats(&self) -> ClonePromptCacheStats {
        let c = &self.counters;
        ClonePromptCacheStats {
            memory_entries: self.memory.len(),
            memory_hits: c.memory_hits.load(Ordering::Relaxed),
            model_disk_hits: c.model_disk_hits.load(Ordering::Relaxed),
            legacy_disk_hits: c.legacy_disk_hits.load(Ordering::Relaxed),
            container_extractions: c.container_extractions.load(Ordering::Relaxed),
            cold_derivations: c.cold_derivations.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::container::{ContainerManifest, ProvenanceMethod};
    use crate::domain::pcm;
    use crate::domain::voice::VoiceName;
    use crate::infrastructure::adapters::audio::stereo_wav;
    use crate::infrastructure::adapters::{
        FakeTtsClient, FileVoiceContainerStore, SymphoniaReferenceLoader,
    };
    use crate::infrastructure::persistence::files::FileClonePromptStore;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    struct Harness {
        dir: TempDir,
        engine: Arc<FakeTtsClient>,
        containers: Arc<FileVoiceContainerStore>,
        cache: ClonePromptCache,
    }

    fn variant(v: &str) -> ModelVariant {
        ModelVariant::new(v).unwrap()
    }

    async fn cache_in(dir: &Path, engine: Arc<FakeTtsClient>) -> (Arc<FileVoiceContainerStore>, ClonePromptCache) {
        let store = Arc::new(FileClonePromptStore::new(dir.join("clone_prompts")).await.unwrap());
        let containers = Arc::new(FileVoiceContainerStore::new(dir.join("containers")).await.unwrap());
        let cache = ClonePromptCache::new(
            store,
            containers.clone(),
            engine,
            Arc::new(SymphoniaReferenceLoader::new()),
            ClonePromptCacheConfig {
                legacy_variant: variant("1.7b"),
                language: "auto".to_string(),
            },
        );
        (containers, cache)
    }

    async fn harness_with(engine: FakeTtsClient) -> Harness {
        let dir = tempdir().unwrap();
        let engine = Arc::new(engine);
        let (containers, cache) = cache_in(dir.path(), engine.clone()).await;
        Harness {
            dir,
            engine,
            containers,
            cache,
        }
    }

    async fn harness() -> Harness {
        harness_with(FakeTtsClient::with_defaults()).await
    }

    fn designed(name: &str) -> VoiceRecord {
        VoiceRecord::designed(VoiceName::new(name).unwrap(), "A calm, low voice")
    }

    /// 存入一个不含 clone prompt 的归档
    async fn store_empty_container(h: &Harness, name: &str) -> std::path::PathBuf {
        let manifest = ContainerManifest::new(name, None, ProvenanceMethod::VoiceDesign, "qwen3-tts");
        let bytes = h.containers.export(&manifest, None, None, &[]).await.unwrap();
        h.containers.store(name, &bytes).await.unwrap()
    }

    #[tokio::test]
    async fn test_second_lookup_is_served_from_memory() {
        let h = harness().await;
        let voice = designed("Ada");

        let first = h.cache.get_or_derive(&voice, &variant("1.7b")).await.unwrap();
        let second = h.cache.get_or_derive(&voice, &variant("1.7b")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(h.engine.design_calls(), 1);
        assert_eq!(h.engine.extract_calls(), 1);

        let stats = h.cache.stats();
        assert_eq!(stats.cold_derivations, 1);
        assert_eq!(stats.memory_hits, 1);
        assert_eq!(stats.memory_entries, 1);
    }

    #[tokio::test]
    async fn test_new_instance_is_served_from_disk() {
        let h = harness().await;
        let voice = designed("Ada");
        let blob = h.cache.get_or_derive(&voice, &variant("0.6b")).await.unwrap();
        assert!(h.dir.path().join("clone_prompts/Ada-0.6b.blob").exists());

        let engine = Arc::new(FakeTtsClient::with_defaults());
        let (_, restarted) = cache_in(h.dir.path(), engine.clone()).await;
        let again = restarted.get_or_derive(&voice, &variant("0.6b")).await.unwrap();

        assert_eq!(again, blob);
        assert_eq!(engine.total_calls(), 0);
        assert_eq!(restarted.stats().model_disk_hits, 1);
    }

    #[tokio::test]
    async fn test_variants_are_cached_independently() {
        let h = harness().await;
        let voice = designed("Ada");

        let small = h.cache.get_or_derive(&voice, &variant("0.6b")).await.unwrap();
        let large = h.cache.get_or_derive(&voice, &variant("1.7b")).await.unwrap();

        assert_ne!(small, large);
        assert_eq!(h.engine.extract_calls(), 2);
    }

    #[tokio::test]
    async fn test_legacy_file_migrates_for_legacy_variant_only() {
        let h = harness().await;
        let legacy = h.dir.path().join("clone_prompts/Ada.blob");
        std::fs::write(&legacy, b"legacy-prompt").unwrap();
        let voice = designed("Ada");

        let blob = h.cache.get_or_derive(&voice, &variant("1.7b")).await.unwrap();
        assert_eq!(blob.as_bytes(), b"legacy-prompt");
        assert_eq!(h.engine.total_calls(), 0);
        assert!(h.dir.path().join("clone_prompts/Ada-1.7b.blob").exists());
        assert_eq!(h.cache.stats().legacy_disk_hits, 1);

        let other = h.cache.get_or_derive(&voice, &variant("0.6b")).await.unwrap();
        assert_ne!(other.as_bytes(), b"legacy-prompt");
        assert_eq!(h.cache.stats().cold_derivations, 1);
    }

    #[tokio::test]
    async fn test_container_prefers_sample_audio() {
        let h = harness().await;
        let voice = designed("Ada");

        let manifest = ContainerManifest::new("Ada", None, ProvenanceMethod::VoiceDesign, "qwen3-tts");
        let reference = pcm::build(&[3; 10], 24000);
        let bytes = h
            .containers
            .export(&manifest, None, None, &[("ref.wav".to_string(), reference)])
            .await
            .unwrap();
        let path = h.containers.store("Ada", &bytes).await.unwrap();
        let sample = pcm::build(&[5; 300], 24000);
        h.containers.update_sample_audio(&path, &sample).await.unwrap();

        let blob = h.cache.get_or_derive(&voice, &variant("1.7b")).await.unwrap();

        assert_eq!(blob, FakeTtsClient::expected_prompt("1.7b", sample.len()));
        assert_eq!(h.engine.design_calls(), 0);
        assert_eq!(h.cache.stats().container_extractions, 1);
        assert!(h.dir.path().join("clone_prompts/Ada-1.7b.blob").exists());
    }

    #[tokio::test]
    async fn test_container_falls_back_to_reference_audio() {
        let h = harness().await;
        let manifest = ContainerManifest::new("Ada", None, ProvenanceMethod::VoiceClone, "qwen3-tts");
        let reference = pcm::build(&[3; 10], 24000);
        let bytes = h
            .containers
            .export(&manifest, None, None, &[("ref.wav".to_string(), reference.clone())])
            .await
            .unwrap();
        h.containers.store("Ada", &bytes).await.unwrap();

        let blob = h
            .cache
            .get_or_derive(&designed("Ada"), &variant("1.7b"))
            .await
            .unwrap();
        assert_eq!(blob, FakeTtsClient::expected_prompt("1.7b", reference.len()));
    }

    #[tokio::test]
    async fn test_cold_derivation_updates_existing_container() {
        let h = harness().await;
        let manifest = ContainerManifest::new("Ada", None, ProvenanceMethod::VoiceDesign, "qwen3-tts");
        let bytes = h.containers.export(&manifest, None, None, &[]).await.unwrap();
        let path = h.containers.store("Ada", &bytes).await.unwrap();

        let blob = h
            .cache
            .get_or_derive(&designed("Ada"), &variant("1.7b"))
            .await
            .unwrap();

        let loaded = h.containers.load(&path, &variant("1.7b")).await.unwrap();
        assert_eq!(loaded.clone_prompt, Some(blob));
        assert!(loaded.sample_audio.is_some());
    }

    #[tokio::test]
    async fn test_cold_derivation_failure_is_fatal() {
        let h = harness_with(FakeTtsClient::with_defaults().failing_extraction()).await;
        let voice = designed("Ada");

        let result = h.cache.get_or_derive(&voice, &variant("1.7b")).await;
        assert!(matches!(
            result,
            Err(CacheError::CloneExtractionFailed { ref voice, .. }) if voice == "Ada"
        ));
        assert_eq!(h.cache.stats().memory_entries, 0);
        assert!(!h.dir.path().join("clone_prompts/Ada-1.7b.blob").exists());
    }

    #[tokio::test]
    async fn test_cloned_voice_reads_reference_audio() {
        let h = harness().await;
        let reference = h.dir.path().join("ada.wav");
        let wav = pcm::build(&[7; 500], 16000);
        std::fs::write(&reference, &wav).unwrap();
        let voice = VoiceRecord::cloned(VoiceName::new("Ada").unwrap(), reference, None);

        let blob = h.cache.get_or_derive(&voice, &variant("1.7b")).await.unwrap();
        assert_eq!(blob, FakeTtsClient::expected_prompt("1.7b", wav.len()));
        assert_eq!(h.engine.design_calls(), 0);
    }

    #[tokio::test]
    async fn test_cloned_voice_missing_reference_fails() {
        let h = harness().await;
        let voice = VoiceRecord::cloned(
            VoiceName::new("Ada").unwrap(),
            h.dir.path().join("missing.wav"),
            None,
        );

        let result = h.cache.get_or_derive(&voice, &variant("1.7b")).await;
        assert!(matches!(result, Err(CacheError::CloneExtractionFailed { .. })));
        assert_eq!(h.engine.extract_calls(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_same_key_derives_once() {
        let h = harness_with(FakeTtsClient::with_defaults().with_latency(Duration::from_millis(50))).await;
        let voice = designed("Ada");
        let v = variant("1.7b");

        let (a, b, c) = tokio::join!(
            h.cache.get_or_derive(&voice, &v),
            h.cache.get_or_derive(&voice, &v),
            h.cache.get_or_derive(&voice, &v),
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert!(c.is_ok());
        assert_eq!(h.engine.design_calls(), 1);
        assert_eq!(h.engine.extract_calls(), 1);
        assert_eq!(h.cache.stats().cold_derivations, 1);
    }

    #[tokio::test]
    async fn test_seed_and_evict() {
        let h = harness().await;
        let voice = designed("Ada");
        let seeded = ClonePromptBlob::from(vec![1, 2, 3]);

        h.cache.seed("Ada", &variant("1.7b"), seeded.clone()).await;
        assert_eq!(
            h.cache.get_or_derive(&voice, &variant("1.7b")).await.unwrap(),
            seeded
        );
        assert_eq!(h.engine.total_calls(), 0);

        let removed = h.cache.evict_voice("Ada").await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(h.cache.stats().memory_entries, 0);
        assert!(!h.dir.path().join("clone_prompts/Ada-1.7b.blob").exists());
    }

    #[tokio::test]
    async fn test_preset_speaker_has_no_clone_prompt() {
        let h = harness().await;
        let voice = VoiceRecord::new(
            VoiceName::new("ryan").unwrap(),
            VoiceKind::PresetSpeaker {
                speaker_id: "Ryan".to_string(),
            },
            None,
        );
        assert!(h.cache.get_or_derive(&voice, &variant("1.7b")).await.is_err());
        assert_eq!(h.engine.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_variant_spellings_share_one_derivation() {
        let h = harness_with(FakeTtsClient::with_defaults().with_latency(Duration::from_millis(50))).await;
        let voice = designed("Ada");

        let upper_variant = variant("1.7B");
        let lower_variant = variant("1.7b");
        let (upper, lower) = tokio::join!(
            h.cache.get_or_derive(&voice, &upper_variant),
            h.cache.get_or_derive(&voice, &lower_variant),
        );

        assert_eq!(upper.unwrap(), lower.unwrap());
        assert_eq!(h.engine.design_calls(), 1);
        assert_eq!(h.engine.extract_calls(), 1);
        assert_eq!(h.cache.stats().memory_entries, 1);
    }

    #[tokio::test]
    async fn test_evict_waits_for_in_flight_derivation() {
        let h = harness_with(FakeTtsClient::with_defaults().with_latency(Duration::from_millis(50))).await;
        let voice = designed("Ada");
        let v = variant("1.7b");

        let evict = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            h.cache.evict_voice("Ada").await
        };
        let (derived, evicted) = tokio::join!(h.cache.get_or_derive(&voice, &v), evict);

        assert!(derived.is_ok());
        assert_eq!(evicted.unwrap(), 1);
        assert!(!h.dir.path().join("clone_prompts/Ada-1.7b.blob").exists());
        assert_eq!(h.cache.stats().memory_entries, 0);

        // 清除之后重新推导
        h.cache.get_or_derive(&voice, &v).await.unwrap();
        assert_eq!(h.engine.design_calls(), 2);
    }

    #[tokio::test]
    async fn test_disk_hit_updates_existing_container() {
        let h = harness().await;
        let path = store_empty_container(&h, "Ada").await;
        let blob = ClonePromptBlob::from(vec![8u8; 16]);
        FileClonePromptStore::new(h.dir.path().join("clone_prompts"))
            .await
            .unwrap()
            .write("Ada", &variant("1.7b"), &blob)
            .await
            .unwrap();

        let found = h
            .cache
            .get_or_derive(&designed("Ada"), &variant("1.7b"))
            .await
            .unwrap();

        assert_eq!(found, blob);
        assert_eq!(h.engine.total_calls(), 0);
        assert_eq!(h.cache.stats().model_disk_hits, 1);
        let loaded = h.containers.load(&path, &variant("1.7b")).await.unwrap();
        assert_eq!(loaded.clone_prompt, Some(blob));
    }

    #[tokio::test]
    async fn test_legacy_migration_updates_existing_container() {
        let h = harness().await;
        let path = store_empty_container(&h, "Ada").await;
        std::fs::write(h.dir.path().join("clone_prompts/Ada.blob"), b"legacy-prompt").unwrap();

        h.cache
            .get_or_derive(&designed("Ada"), &variant("1.7b"))
            .await
            .unwrap();

        let loaded = h.containers.load(&path, &variant("1.7b")).await.unwrap();
        assert_eq!(
            loaded.clone_prompt.as_ref().map(ClonePromptBlob::as_bytes),
            Some(&b"legacy-prompt"[..])
        );
    }

    #[tokio::test]
    async fn test_container_embedded_prompt_skips_extraction() {
        let h = harness().await;
        let embedded = ClonePromptBlob::from(vec![6u8; 12]);
        let manifest = ContainerManifest::new("Ada", None, ProvenanceMethod::VoiceDesign, "qwen3-tts");
        let bytes = h
            .containers
            .export(
                &manifest,
                Some((&variant("1.7b"), &embedded)),
                Some(pcm::build(&[5; 300], 24000).as_slice()),
                &[],
            )
            .await
            .unwrap();
        h.containers.store("Ada", &bytes).await.unwrap();

        let blob = h
            .cache
            .get_or_derive(&designed("Ada"), &variant("1.7b"))
            .await
            .unwrap();

        assert_eq!(blob, embedded);
        assert_eq!(h.engine.total_calls(), 0);
        assert_eq!(h.cache.stats().container_extractions, 1);
        assert!(h.dir.path().join("clone_prompts/Ada-1.7b.blob").exists());
    }

    #[tokio::test]
    async fn test_container_extraction_failure_falls_through_to_cold_derivation() {
        let h = harness_with(FakeTtsClient::with_defaults().failing_first_extractions(1)).await;
        let manifest = ContainerManifest::new("Ada", None, ProvenanceMethod::VoiceDesign, "qwen3-tts");
        let sample = pcm::build(&[5; 300], 24000);
        let bytes = h
            .containers
            .export(&manifest, None, Some(sample.as_slice()), &[])
            .await
            .unwrap();
        h.containers.store("Ada", &bytes).await.unwrap();

        let blob = h
            .cache
            .get_or_derive(&designed("Ada"), &variant("1.7b"))
            .await
            .unwrap();

        assert_ne!(blob, FakeTtsClient::expected_prompt("1.7b", sample.len()));
        assert_eq!(h.engine.extract_calls(), 2);
        assert_eq!(h.engine.design_calls(), 1);
        let stats = h.cache.stats();
        assert_eq!(stats.container_extractions, 0);
        assert_eq!(stats.cold_derivations, 1);
    }

    #[tokio::test]
    async fn test_container_reference_audio_is_normalized() {
        let h = harness().await;
        let manifest = ContainerManifest::new("Ada", None, ProvenanceMethod::VoiceClone, "qwen3-tts");
        let frames: Vec<(i16, i16)> = (0..480).map(|i| (i as i16, i as i16)).collect();
        let stereo = stereo_wav(&frames, 24000);
        let bytes = h
            .containers
            .export(&manifest, None, None, &[("ada.wav".to_string(), stereo.clone())])
            .await
            .unwrap();
        h.containers.store("Ada", &bytes).await.unwrap();

        let blob = h
            .cache
            .get_or_derive(&designed("Ada"), &variant("1.7b"))
            .await
            .unwrap();

        let mono_len = pcm::WAV_HEADER_LEN + 480 * 2;
        assert_ne!(stereo.len(), mono_len);
        assert_eq!(blob, FakeTtsClient::expected_prompt("1.7b", mono_len));
        assert_eq!(h.engine.design_calls(), 0);
    }
}
