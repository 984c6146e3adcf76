//! Voice Container - Manifest

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::voice::VoiceKind;

/// 当前归档格式版本
pub const FORMAT_VERSION: u32 = 1;

/// 音色来源方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvenanceMethod {
    Builtin,
    VoiceDesign,
    VoiceClone,
    PresetSpeaker,
}

impl ProvenanceMethod {
    pub fn from_kind(kind: &VoiceKind) -> Self {
        match kind {
            VoiceKind::Builtin => Self::Builtin,
            VoiceKind::Designed => Self::VoiceDesign,
            VoiceKind::Cloned { .. } => Self::VoiceClone,
            VoiceKind::PresetSpeaker { .. } => Self::PresetSpeaker,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Builtin => "builtin",
            Self::VoiceDesign => "voice_design",
            Self::VoiceClone => "voice_clone",
            Self::PresetSpeaker => "preset_speaker",
        }
    }
}

/// 来源信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub method: ProvenanceMethod,
    /// 生成 embedding 的引擎标识
    pub engine: String,
}

/// 归档清单
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerManifest {
    pub format_version: u32,
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub provenance: Provenance,
}

impl ContainerManifest {
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        method: ProvenanceMethod,
        engine: impl Into<String>,
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            id: Uuid::new_v4(),
            name: name.into(),
            description,
            created_at: Utc::now(),
            provenance: Provenance {
                method,
                engine: engine.into(),
            },
        }
    }
}
