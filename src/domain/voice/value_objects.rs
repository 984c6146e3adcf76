//! Voice Context - Value Objects

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use super::VoiceError;

/// 音色名称
///
/// 唯一、区分大小写；同时用作磁盘缓存文件名前缀，因此不允许路径分隔符
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VoiceName(String);

impl VoiceName {
    pub fn new(name: impl Into<String>) -> Result<Self, VoiceError> {
        let name = name.into();
        if name.is_empty() {
            return Err(VoiceError::InvalidName("voice name cannot be empty".to_string()));
        }
        if name.chars().count() > 100 {
            return Err(VoiceError::InvalidName(format!(
                "voice name longer than 100 characters: {}",
                name
            )));
        }
        if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            return Err(VoiceError::InvalidName(format!(
                "voice name must not be a path: {}",
                name
            )));
        }
        // 名称会出现在响应头与文件名中
        if name.chars().any(|c| c == '"' || c.is_control()) {
            return Err(VoiceError::InvalidName(format!(
                "voice name contains quotes or control characters: {:?}",
                name
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VoiceName {
    type Error = VoiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VoiceName> for String {
    fn from(name: VoiceName) -> Self {
        name.0
    }
}

impl std::fmt::Display for VoiceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 音色类型
///
/// 合成路径只在两处分派：是否绕过缓存、冷推导时的音频来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VoiceKind {
    /// 内置音色（按描述设计）
    Builtin,
    /// 用户按描述设计的音色
    Designed,
    /// 由参考音频克隆的音色
    Cloned { reference_audio: PathBuf },
    /// 后端预置说话人，直接按 ID 合成
    PresetSpeaker { speaker_id: String },
}

impl VoiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceKind::Builtin => "builtin",
            VoiceKind::Designed => "designed",
            VoiceKind::Cloned { .. } => "cloned",
            VoiceKind::PresetSpeaker { .. } => "preset_speaker",
        }
    }

    /// 是否需要 clone prompt
    pub fn uses_clone_prompt(&self) -> bool {
        !matches!(self, VoiceKind::PresetSpeaker { .. })
    }
}

/// 模型变体（如 "0.6b"、"1.7b"）
///
/// clone prompt 在不同变体之间不可互换
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelVariant(String);

impl ModelVariant {
    pub fn new(variant: impl Into<String>) -> Result<Self, VoiceError> {
        let variant = variant.into().trim().to_string();
        if variant.is_empty() {
            return Err(VoiceError::InvalidConfig(
                "model variant cannot be empty".to_string(),
            ));
        }
        Ok(Self(variant))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 文件名/归档路径用的 slug：小写，`[a-z0-9.]` 以外的字符替换为 `_`
    ///
    /// slug 中不含 `-`，`<voice>-<slug>.blob` 可在最后一个 `-` 处无歧义拆分
    pub fn slug(&self) -> String {
        self.0
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl std::fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// clone prompt 缓存键：(音色名, 模型变体 slug)
///
/// 与磁盘文件名、归档路径使用同一个 slug，`1.7B` 与 `1.7b` 是同一个键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub voice_name: String,
    pub variant_slug: String,
}

impl CacheKey {
    pub fn new(voice_name: impl Into<String>, model_variant: &ModelVariant) -> Self {
        Self {
            voice_name: voice_name.into(),
            variant_slug: model_variant.slug(),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.voice_name, self.variant_slug)
    }
}

/// 派生的声纹参数（不透明字节）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClonePromptBlob(Arc<[u8]>);

impl ClonePromptBlob {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for ClonePromptBlob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }
}

/// 单块合成上下文
///
/// 元数据键统一为去空白的小写形式，透传给后端
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationContext {
    pub phrase: String,
    metadata: BTreeMap<String, String>,
}

impl GenerationContext {
    pub fn new(phrase: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            metadata: BTreeMap::new(),
        }
    }

    fn normalize_key(key: &str) -> String {
        key.trim().to_lowercase()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.metadata.insert(Self::normalize_key(key), value.into());
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(&Self::normalize_key(key))
            .map(String::as_str)
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_name_validation() {
        assert!(VoiceName::new("Narrator").is_ok());
        assert!(VoiceName::new("").is_err());
        assert!(VoiceName::new("../etc").is_err());
        assert!(VoiceName::new("a\\b").is_err());
        assert!(VoiceName::new("x".repeat(101)).is_err());
        assert!(VoiceName::new("say \"hi\"").is_err());
        assert!(VoiceName::new("line\nbreak").is_err());
        assert!(VoiceName::new("tab\there").is_err());
        assert!(VoiceName::new("Zoë the 2nd").is_ok());
    }

    #[test]
    fn test_model_variant_slug() {
        let variant = ModelVariant::new("Qwen3-TTS 1.7B").unwrap();
        assert_eq!(variant.slug(), "qwen3_tts_1.7b");
        assert!(!variant.slug().contains('-'));
        assert!(ModelVariant::new("  ").is_err());
    }

    #[test]
    fn test_cache_key_follows_slug() {
        let upper = CacheKey::new("Ada", &ModelVariant::new("1.7B").unwrap());
        let lower = CacheKey::new("Ada", &ModelVariant::new(" 1.7b ").unwrap());
        assert_eq!(upper, lower);
        assert_eq!(upper.to_string(), "Ada@1.7b");
        assert_ne!(upper, CacheKey::new("ada", &ModelVariant::new("1.7b").unwrap()));
    }

    #[test]
    fn test_generation_context_normalizes_keys() {
        let ctx = GenerationContext::new("Hello.")
            .with("Language", "en")
            .with("  SPEAKER_STYLE ", "calm");
        assert_eq!(ctx.get("language"), Some("en"));
        assert_eq!(ctx.get("LANGUAGE"), Some("en"));
        assert_eq!(ctx.get("speaker_style"), Some("calm"));
        assert_eq!(ctx.metadata().len(), 2);
    }

    #[test]
    fn test_voice_kind_serde_tagging() {
        let kind = VoiceKind::PresetSpeaker {
            speaker_id: "Vivian".to_string(),
        };
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["kind"], "preset_speaker");
        assert_eq!(json["speaker_id"], "Vivian");
        assert!(!kind.uses_clone_prompt());
        assert!(VoiceKind::Designed.uses_clone_prompt());
    }
}
