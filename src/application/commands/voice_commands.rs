//! Voice Commands

/// 按描述设计音色（同名覆盖）
#[derive(Debug, Clone)]
pub struct DesignVoice {
    pub name: String,
    pub description: String,
}

/// 由参考音频克隆音色
#[derive(Debug, Clone)]
pub struct CloneVoice {
    pub name: String,
    pub description: Option<String>,
    pub audio_data: Vec<u8>,
    /// 参考音频扩展名：wav / mp3 / flac
    pub extension: String,
}

/// 删除音色命令
#[derive(Debug, Clone)]
pub struct DeleteVoice {
    pub name: String,
}
