//! Voice Container Context - 音色归档
//!
//! 清单 + 按规范路径存放的 embedding + 参考音频

mod manifest;
pub mod paths;

pub use manifest::{ContainerManifest, Provenance, ProvenanceMethod, FORMAT_VERSION};
