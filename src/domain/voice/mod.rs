//! Voice Context - 音色限界上下文
//!
//! 职责:
//! - 音色记录与类型
//! - clone prompt 缓存键、模型变体
//! - 内置音色数据

mod aggregate;
mod builtin;
mod errors;
mod value_objects;

pub use aggregate::VoiceRecord;
pub use builtin::builtin_voices;
pub use errors::VoiceError;
pub use value_objects::{
    CacheKey, ClonePromptBlob, GenerationContext, ModelVariant, VoiceKind, VoiceName,
};
