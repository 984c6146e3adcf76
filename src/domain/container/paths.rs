//! Voice Container - 归档内规范路径
//!
//! 新的模型变体只新增路径，从不改动已有路径

use crate::domain::voice::ModelVariant;

pub const MANIFEST_PATH: &str = "manifest.json";
pub const EMBEDDINGS_PREFIX: &str = "embeddings/";
pub const REFERENCE_PREFIX: &str = "reference/";

const CLONE_PROMPT_FILE: &str = "clone-prompt.bin";
const SAMPLE_AUDIO_FILE: &str = "sample-audio.wav";

/// `embeddings/<engine>/<variant>/clone-prompt.bin`
pub fn clone_prompt_path(engine: &str, variant: &ModelVariant) -> String {
    format!(
        "{}{}/{}/{}",
        EMBEDDINGS_PREFIX,
        engine,
        variant.slug(),
        CLONE_PROMPT_FILE
    )
}

/// `embeddings/<engine>/sample-audio.wav`
pub fn sample_audio_path(engine: &str) -> String {
    format!("{}{}/{}", EMBEDDINGS_PREFIX, engine, SAMPLE_AUDIO_FILE)
}

/// `reference/<file name>`，只保留文件名部分
pub fn reference_path(file_name: &str) -> String {
    let base = file_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(file_name);
    format!("{}{}", REFERENCE_PREFIX, base)
}

/// 从 clone prompt 路径中解析出变体 slug
pub fn variant_slug_of(path: &str, engine: &str) -> Option<String> {
    let rest = path
        .strip_prefix(EMBEDDINGS_PREFIX)?
        .strip_prefix(engine)?
        .strip_prefix('/')?;
    let (slug, file) = rest.split_once('/')?;
    if file == CLONE_PROMPT_FILE && !slug.is_empty() {
        Some(slug.to_string())
    } else {
        None
    }
}
