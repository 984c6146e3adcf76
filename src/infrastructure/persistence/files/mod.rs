//! 文件存储 - clone prompt 磁盘层与原子写入

mod atomic;
mod clone_prompt_store;

pub use atomic::write_atomic;
pub use clone_prompt_store::FileClonePromptStore;
