//! Voxcast - 音色合成与音色归档服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Voice Context: 音色记录、模型变体、clone prompt
//! - Container Context: `.voice` 归档清单与规范路径
//! - PCM 编解码、文本分块
//!
//! 应用层 (application/):
//! - Ports: 端口定义（TtsEngine, ClonePromptCache, VoiceContainer, Repositories）
//! - Commands: 设计/克隆/删除音色、合成、归档导入导出
//! - Queries: 音色目录
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API
//! - Memory: 分层 clone prompt 缓存
//! - Persistence: JSON 音色索引 + clone prompt 文件
//! - Adapters: TTS Client, ZIP 归档, 参考音频解码, 音频文件存储

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
