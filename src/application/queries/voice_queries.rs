//! Voice Queries

/// 解析音色查询；name 为空时取默认（第一个内置）音色
#[derive(Debug, Clone, Default)]
pub struct GetVoice {
    pub name: Option<String>,
}

/// 列出所有音色查询
#[derive(Debug, Clone)]
pub struct ListVoices;
