//! Persistence Layer - 数据持久化
//!
//! JSON 音色索引与 clone prompt 磁盘文件

pub mod files;
pub mod json;

pub use files::FileClonePromptStore;
pub use json::JsonVoiceRepository;
