//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    CloneVoiceHandler, DeleteVoiceHandler, DesignVoiceHandler, ExportVoiceHandler,
    ImportVoiceHandler, SynthesisSettings, SynthesizeHandler,
    // Query handlers
    GetVoiceHandler, ListVoicesHandler,
    // Ports
    ClonePromptCachePort, TtsEnginePort, VoiceAudioStoragePort, VoiceContainerPort,
    VoiceRepositoryPort,
};
use crate::domain::voice::VoiceRecord;

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub tts_engine: Arc<dyn TtsEnginePort>,
    pub clone_prompt_cache: Arc<dyn ClonePromptCachePort>,

    // ========== Command Handlers ==========
    pub design_voice_handler: DesignVoiceHandler,
    pub clone_voice_handler: CloneVoiceHandler,
    pub delete_voice_handler: DeleteVoiceHandler,
    pub synthesize_handler: SynthesizeHandler,
    pub export_voice_handler: ExportVoiceHandler,
    pub import_voice_handler: ImportVoiceHandler,

    // ========== Query Handlers ==========
    pub get_voice_handler: Arc<GetVoiceHandler>,
    pub list_voices_handler: ListVoicesHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        voice_repo: Arc<dyn VoiceRepositoryPort>,
        clone_prompt_cache: Arc<dyn ClonePromptCachePort>,
        containers: Arc<dyn VoiceContainerPort>,
        audio_storage: Arc<dyn VoiceAudioStoragePort>,
        tts_engine: Arc<dyn TtsEnginePort>,
        builtins: Vec<VoiceRecord>,
        settings: SynthesisSettings,
    ) -> Self {
        let builtins = Arc::new(builtins);
        let get_voice_handler = Arc::new(GetVoiceHandler::new(voice_repo.clone(), builtins.clone()));

        Self {
            // Command handlers
            design_voice_handler: DesignVoiceHandler::new(
                voice_repo.clone(),
                clone_prompt_cache.clone(),
            ),
            clone_voice_handler: CloneVoiceHandler::new(
                voice_repo.clone(),
                audio_storage.clone(),
                clone_prompt_cache.clone(),
            ),
            delete_voice_handler: DeleteVoiceHandler::new(
                voice_repo.clone(),
                clone_prompt_cache.clone(),
                containers.clone(),
            ),
            synthesize_handler: SynthesizeHandler::new(
                get_voice_handler.clone(),
                clone_prompt_cache.clone(),
                tts_engine.clone(),
                settings.clone(),
            ),
            export_voice_handler: ExportVoiceHandler::new(
                get_voice_handler.clone(),
                clone_prompt_cache.clone(),
                containers.clone(),
                audio_storage.clone(),
                settings.clone(),
            ),
            import_voice_handler: ImportVoiceHandler::new(
                voice_repo.clone(),
                clone_prompt_cache.clone(),
                containers,
                audio_storage,
                settings,
            ),

            // Query handlers
            list_voices_handler: ListVoicesHandler::new(voice_repo, builtins),
            get_voice_handler,

            // Ports
            tts_engine,
            clone_prompt_cache,
        }
    }
}
