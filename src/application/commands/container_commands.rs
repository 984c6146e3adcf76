//! Container Commands - 音色归档导入导出

/// 导出音色归档
#[derive(Debug, Clone)]
pub struct ExportVoice {
    pub name: String,
    /// 为空时使用默认模型变体
    pub model_variant: Option<String>,
}

/// 导入音色归档
#[derive(Debug, Clone)]
pub struct ImportVoice {
    pub archive_data: Vec<u8>,
    /// 为空时使用默认模型变体
    pub model_variant: Option<String>,
}
