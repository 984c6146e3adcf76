//! 文本分块器
//!
//! 将任意长度的文本切分为按句子边界、按词数上限的合成块

use unicode_segmentation::UnicodeSegmentation;

/// 默认每块最大词数
pub const DEFAULT_MAX_WORDS: usize = 200;

/// 分块配置
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// 每块最大词数（以空白分隔计数）
    pub max_words: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_words: DEFAULT_MAX_WORDS,
        }
    }
}

/// 以空白分隔的词数
#[inline]
fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// 按 Unicode 句子边界（UAX #29）切分
///
/// 无法识别出任何句子时，整段视为一句
fn split_sentences(text: &str) -> Vec<&str> {
    let sentences: Vec<&str> = text
        .unicode_sentences()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if sentences.is_empty() {
        vec![text]
    } else {
        sentences
    }
}

/// 对文本进行分块
///
/// 分块策略：
/// 1. 去除首尾空白，空输入返回空序列
/// 2. 按句子边界切分
/// 3. 贪心累积句子，加入下一句会超过 `max_words` 时先输出当前块
/// 4. 单句超过上限时单独成块，从不在句中切断
pub fn chunk_text(text: &str, config: &ChunkConfig) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_words = 0;

    for sentence in split_sentences(trimmed) {
        let words = word_count(sentence);

        if !current.is_empty() && current_words + words > config.max_words {
            chunks.push(current.join(" "));
            current.clear();
            current_words = 0;
        }

        current.push(sentence);
        current_words += words;
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}
