//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod audio;
pub mod container;
pub mod storage;
pub mod tts;

pub use audio::*;
pub use container::*;
pub use storage::*;
pub use tts::*;
