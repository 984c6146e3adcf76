//! Memory Layer - 进程内状态
//!
//! 分层 clone prompt 缓存：内存表 + 磁盘/归档后备

mod clone_prompt_cache;

pub use clone_prompt_cache::{ClonePromptCache, ClonePromptCacheConfig};
