//! Voxcast - 音色合成与音色归档服务

use std::sync::Arc;

use voxcast::application::{SynthesisSettings, TtsEnginePort};
use voxcast::config::{load_config, print_config, AppConfig, EngineKind};
use voxcast::domain::voice::{builtin_voices, ModelVariant};
use voxcast::infrastructure::adapters::{
    FakeTtsClient, FileVoiceAudioStorage, FileVoiceContainerStore, HttpTtsClient,
    HttpTtsClientConfig, SymphoniaReferenceLoader,
};
use voxcast::infrastructure::http::{AppState, HttpServer};
use voxcast::infrastructure::{
    ClonePromptCache, ClonePromptCacheConfig, FileClonePromptStore, JsonVoiceRepository,
};

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},voxcast={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn create_engine(config: &AppConfig) -> anyhow::Result<Arc<dyn TtsEnginePort>> {
    let engine: Arc<dyn TtsEnginePort> = match config.tts.engine {
        EngineKind::Http => {
            let tts_config =
                HttpTtsClientConfig::new(&config.tts.url).with_timeout(config.tts.timeout_secs);
            Arc::new(HttpTtsClient::new(tts_config)?)
        }
        EngineKind::Fake => {
            tracing::warn!("Using in-process fake synthesis engine");
            Arc::new(FakeTtsClient::with_defaults())
        }
    };
    Ok(engine)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);
    tracing::info!("Voxcast {}", env!("CARGO_PKG_VERSION"));
    print_config(&config);

    let storage = &config.storage;
    tokio::fs::create_dir_all(&storage.data_dir).await?;

    let model_variant = ModelVariant::new(config.tts.model_variant.as_str())?;
    let legacy_variant = ModelVariant::new(config.tts.legacy_model_variant.as_str())?;

    // 适配器
    let voice_repo = Arc::new(JsonVoiceRepository::new(storage.voices_index()));
    let prompt_store = Arc::new(
        FileClonePromptStore::new(storage.clone_prompts_dir())
            .await?
            .with_known_variants([&model_variant, &legacy_variant]),
    );
    let containers = Arc::new(FileVoiceContainerStore::new(storage.containers_dir()).await?);
    let audio_storage = Arc::new(FileVoiceAudioStorage::new(storage.voices_dir()).await?);
    let tts_engine = create_engine(&config)?;

    let clone_prompt_cache = Arc::new(ClonePromptCache::new(
        prompt_store,
        containers.clone(),
        tts_engine.clone(),
        Arc::new(SymphoniaReferenceLoader::new()),
        ClonePromptCacheConfig {
            legacy_variant,
            language: config.tts.language.clone(),
        },
    ));

    let settings = SynthesisSettings {
        language: config.tts.language.clone(),
        model_variant,
        max_words: config.synthesis.max_words,
        sample_rate: config.synthesis.sample_rate,
        engine_name: config.tts.engine_name.clone(),
    };

    let state = AppState::new(
        voice_repo,
        clone_prompt_cache,
        containers,
        audio_storage,
        tts_engine,
        builtin_voices(),
        settings,
    );

    let server = HttpServer::new(&config.server, state);

    server
        .serve(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
