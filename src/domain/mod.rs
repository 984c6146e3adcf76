//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Voice Context: 音色记录、模型变体、clone prompt
//! - Container Context: 可移植的音色归档清单与路径
//!
//! 以及共享的纯函数组件：PCM 编解码、文本分块

pub mod container;
pub mod pcm;
pub mod voice;

mod text_chunker;

pub use text_chunker::{chunk_text, ChunkConfig, DEFAULT_MAX_WORDS};
