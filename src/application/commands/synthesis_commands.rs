//! Synthesis Commands

use std::collections::BTreeMap;

/// 文本合成命令
#[derive(Debug, Clone, Default)]
pub struct SynthesizeSpeech {
    pub text: String,
    /// 为空时使用默认音色
    pub voice_name: Option<String>,
    pub language: Option<String>,
    pub model_variant: Option<String>,
    /// 透传给后端的元数据
    pub metadata: BTreeMap<String, String>,
}
