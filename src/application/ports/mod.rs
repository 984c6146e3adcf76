//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod clone_prompt_cache;
mod clone_prompt_store;
mod reference_audio;
mod repositories;
mod tts_engine;
mod voice_audio_storage;
mod voice_container;

pub use clone_prompt_cache::{CacheError, CacheTier, ClonePromptCachePort, ClonePromptCacheStats};
pub use clone_prompt_store::{ClonePromptStorePort, StoreError};
pub use reference_audio::{ReferenceAudioError, ReferenceAudioPort};
pub use repositories::{RepositoryError, VoiceRepositoryPort};
pub use tts_engine::{
    ClonePromptRequest, DesignRequest, SynthesisRequest, SynthesisResponse, TtsEnginePort,
    TtsError, VoiceConditioning,
};
pub use voice_audio_storage::{AudioStorageError, VoiceAudioStoragePort};
pub use voice_container::{ContainerError, ImportedVoice, VoiceContainerPort};
