//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（TtsEngine、ClonePromptCache、VoiceContainer 等）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    // Container commands
    ExportVoice,
    ImportVoice,
    // Synthesis commands
    SynthesizeSpeech,
    // Voice commands
    CloneVoice,
    DeleteVoice,
    DesignVoice,
    // Handlers
    handlers::{
        CloneVoiceHandler, DeleteVoiceHandler, DeleteVoiceResponse, DesignVoiceHandler,
        ExportVoiceHandler, ExportVoiceResponse, ImportVoiceHandler, ImportVoiceResponse,
        SynthesisOutput, SynthesisSettings, SynthesizeHandler,
    },
};

pub use error::ApplicationError;

pub use ports::{
    // Clone prompt cache
    CacheError,
    CacheTier,
    ClonePromptCachePort,
    ClonePromptCacheStats,
    // Storage
    AudioStorageError,
    ClonePromptStorePort,
    ReferenceAudioPort,
    RepositoryError,
    StoreError,
    VoiceAudioStoragePort,
    VoiceRepositoryPort,
    // Voice container
    ContainerError,
    ImportedVoice,
    VoiceContainerPort,
    // TTS engine
    TtsEnginePort,
    TtsError,
};

pub use queries::{
    GetVoice,
    ListVoices,
    // Handlers
    handlers::{GetVoiceHandler, ListVoicesHandler, VoiceResponse},
};
