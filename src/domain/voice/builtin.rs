//! 内置音色
//!
//! 静态数据，顺序固定：未指定音色时取第一个

use chrono::{DateTime, Utc};

use super::{VoiceKind, VoiceName, VoiceRecord};

struct BuiltinVoice {
    name: &'static str,
    kind: BuiltinKind,
    description: &'static str,
}

enum BuiltinKind {
    Designed,
    Preset(&'static str),
}

const BUILTIN_VOICES: &[BuiltinVoice] = &[
    BuiltinVoice {
        name: "narrator",
        kind: BuiltinKind::Designed,
        description: "A calm, warm middle-aged narrator with clear articulation and a steady, \
                      unhurried pace, suited to long-form reading.",
    },
    BuiltinVoice {
        name: "vivian",
        kind: BuiltinKind::Preset("Vivian"),
        description: "Bright young female preset speaker.",
    },
    BuiltinVoice {
        name: "ryan",
        kind: BuiltinKind::Preset("Ryan"),
        description: "Energetic male preset speaker.",
    },
];

/// 内置音色列表（固定顺序）
pub fn builtin_voices() -> Vec<VoiceRecord> {
    BUILTIN_VOICES
        .iter()
        .filter_map(|v| {
            let name = VoiceName::new(v.name).ok()?;
            let kind = match v.kind {
                BuiltinKind::Designed => VoiceKind::Builtin,
                BuiltinKind::Preset(speaker_id) => VoiceKind::PresetSpeaker {
                    speaker_id: speaker_id.to_string(),
                },
            };
            Some(
                VoiceRecord::new(name, kind, Some(v.description.to_string()))
                    .with_created_at(DateTime::<Utc>::default()),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_order_is_stable() {
        let voices = builtin_voices();
        assert_eq!(voices.len(), BUILTIN_VOICES.len());
        assert_eq!(voices[0].name().as_str(), "narrator");
        assert_eq!(voices[0].kind(), &VoiceKind::Builtin);
        assert!(matches!(
            voices[1].kind(),
            VoiceKind::PresetSpeaker { speaker_id } if speaker_id == "Vivian"
        ));
    }
}
