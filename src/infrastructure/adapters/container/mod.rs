//! Voice Container Adapter - ZIP 归档

pub mod archive;
mod file_container_store;

pub use file_container_store::FileVoiceContainerStore;
