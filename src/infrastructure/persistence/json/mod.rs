//! JSON 文档存储

mod voice_repo;

pub use voice_repo::JsonVoiceRepository;
