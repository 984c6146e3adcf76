//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：处理所有写操作

mod container_commands;
mod synthesis_commands;
mod voice_commands;

pub mod handlers;

pub use container_commands::*;
pub use synthesis_commands::*;
pub use voice_commands::*;
