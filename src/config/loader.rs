//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{default_data_dir, AppConfig, EngineKind};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// # 环境变量示例
/// - `VOXCAST_SERVER__PORT=8080`
/// - `VOXCAST_TTS__ENGINE=fake`
/// - `VOXCAST_TTS__MODEL_VARIANT=0.6b`
/// - `VOXCAST_STORAGE__DATA_DIR=/var/lib/voxcast`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let data_dir = default_data_dir();

    let mut builder = Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5070)?
        .set_default("tts.engine", "http")?
        .set_default("tts.url", "http://localhost:8000")?
        .set_default("tts.timeout_secs", 120)?
        .set_default("tts.engine_name", "qwen3-tts")?
        .set_default("tts.language", "auto")?
        .set_default("tts.model_variant", "1.7b")?
        .set_default("tts.legacy_model_variant", "1.7b")?
        .set_default("synthesis.max_words", 200)?
        .set_default("synthesis.sample_rate", 24000)?
        .set_default("storage.data_dir", data_dir.to_string_lossy().to_string())?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 前缀 VOXCAST_，层级分隔符 __，例如 VOXCAST_TTS__URL=http://tts-server:8000
    builder = builder.add_source(
        Environment::with_prefix("VOXCAST")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.tts.engine == EngineKind::Http && config.tts.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS URL cannot be empty".to_string(),
        ));
    }

    if config.tts.model_variant.trim().is_empty() || config.tts.legacy_model_variant.trim().is_empty()
    {
        return Err(ConfigError::ValidationError(
            "Model variant cannot be empty".to_string(),
        ));
    }

    if config.synthesis.max_words == 0 {
        return Err(ConfigError::ValidationError(
            "synthesis.max_words must be at least 1".to_string(),
        ));
    }

    if config.synthesis.sample_rate == 0 {
        return Err(ConfigError::ValidationError(
            "synthesis.sample_rate cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("TTS Engine: {:?}", config.tts.engine);
    if config.tts.engine == EngineKind::Http {
        tracing::info!("TTS URL: {}", config.tts.url);
        tracing::info!("TTS Timeout: {}s", config.tts.timeout_secs);
    }
    tracing::info!("Engine Name: {}", config.tts.engine_name);
    tracing::info!("Model Variant: {}", config.tts.model_variant);
    tracing::info!("Legacy Model Variant: {}", config.tts.legacy_model_variant);
    tracing::info!("Language: {}", config.tts.language);
    tracing::info!("Max Words Per Chunk: {}", config.synthesis.max_words);
    tracing::info!("Data Directory: {:?}", config.storage.data_dir);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_url_allowed_for_fake_engine() {
        let mut config = AppConfig::default();
        config.tts.url = String::new();
        assert!(validate_config(&config).is_err());

        config.tts.engine = EngineKind::Fake;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_max_words() {
        let mut config = AppConfig::default();
        config.synthesis.max_words = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("voxcast.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9000

[tts]
engine = "fake"
model_variant = "0.6b"

[storage]
data_dir = "/tmp/voxcast-test"
"#,
        )
        .unwrap();

        let config = load_config_from_path(Some(&path)).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.tts.engine, EngineKind::Fake);
        assert_eq!(config.tts.model_variant, "0.6b");
        assert_eq!(config.tts.legacy_model_variant, "1.7b");
        assert_eq!(config.synthesis.max_words, 200);
        assert_eq!(
            config.storage.data_dir,
            std::path::PathBuf::from("/tmp/voxcast-test")
        );
    }
}
