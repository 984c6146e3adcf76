//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// TTS 引擎配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 合成配置
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 合成后端类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// 远程 HTTP 服务
    #[default]
    Http,
    /// 进程内确定性后端（本地开发）
    Fake,
}

/// TTS 引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub engine: EngineKind,

    /// TTS 服务基础 URL
    #[serde(default = "default_tts_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,

    /// 写入归档 provenance 的引擎标识
    #[serde(default = "default_engine_name")]
    pub engine_name: String,

    #[serde(default = "default_language")]
    pub language: String,

    /// 默认模型变体
    #[serde(default = "default_model_variant")]
    pub model_variant: String,

    /// 无后缀旧缓存文件所属的模型变体
    #[serde(default = "default_model_variant")]
    pub legacy_model_variant: String,
}

fn default_tts_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_tts_timeout() -> u64 {
    120
}

fn default_engine_name() -> String {
    "qwen3-tts".to_string()
}

fn default_language() -> String {
    "auto".to_string()
}

fn default_model_variant() -> String {
    "1.7b".to_string()
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            url: default_tts_url(),
            timeout_secs: default_tts_timeout(),
            engine_name: default_engine_name(),
            language: default_language(),
            model_variant: default_model_variant(),
            legacy_model_variant: default_model_variant(),
        }
    }
}

/// 合成配置
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisConfig {
    /// 每块最多词数
    #[serde(default = "default_max_words")]
    pub max_words: usize,

    /// 首块头部无法读取时使用的采样率
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

fn default_max_words() -> usize {
    200
}

fn default_sample_rate() -> u32 {
    24000
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_words: default_max_words(),
            sample_rate: default_sample_rate(),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 数据根目录
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// 用户数据目录下的 `voxcast`，取不到时使用 `./data`
pub(crate) fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("voxcast"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    /// 音色索引文件
    pub fn voices_index(&self) -> PathBuf {
        self.data_dir.join("voices.json")
    }

    pub fn clone_prompts_dir(&self) -> PathBuf {
        self.data_dir.join("clone_prompts")
    }

    pub fn containers_dir(&self) -> PathBuf {
        self.data_dir.join("containers")
    }

    /// 参考音频与导入音频
    pub fn voices_dir(&self) -> PathBuf {
        self.data_dir.join("voices")
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
