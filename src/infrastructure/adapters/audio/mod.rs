//! Audio Adapter - 参考音频读取

mod reference_loader;

pub use reference_loader::SymphoniaReferenceLoader;
#[cfg(test)]
pub(crate) use reference_loader::stereo_wav;
