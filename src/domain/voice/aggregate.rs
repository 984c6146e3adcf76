//! Voice Context - Aggregate Root

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{VoiceKind, VoiceName};

/// 音色记录
///
/// 不变量:
/// - name 在目录内唯一（区分大小写），保存时按 name 覆盖
/// - 克隆音色必须携带参考音频路径，预置说话人必须携带说话人 ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceRecord {
    name: VoiceName,
    #[serde(flatten)]
    kind: VoiceKind,
    #[serde(default)]
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl VoiceRecord {
    pub fn new(name: VoiceName, kind: VoiceKind, description: Option<String>) -> Self {
        Self {
            name,
            kind,
            description,
            created_at: Utc::now(),
        }
    }

    /// 设计音色
    pub fn designed(name: VoiceName, description: impl Into<String>) -> Self {
        Self::new(name, VoiceKind::Designed, Some(description.into()))
    }

    /// 克隆音色
    pub fn cloned(name: VoiceName, reference_audio: PathBuf, description: Option<String>) -> Self {
        Self::new(name, VoiceKind::Cloned { reference_audio }, description)
    }

    /// 指定创建时间（内置数据、导入）
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    // Getters
    pub fn name(&self) -> &VoiceName {
        &self.name
    }

    pub fn kind(&self) -> &VoiceKind {
        &self.kind
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
