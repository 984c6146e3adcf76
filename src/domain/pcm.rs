//! PCM 音频编解码
//!
//! 单声道 16 位 PCM WAV 的构建、解析与拼接。纯函数，无副作用。

use thiserror::Error;

/// 固定 WAV 头长度（RIFF + fmt + data）
pub const WAV_HEADER_LEN: usize = 44;

const BITS_PER_SAMPLE: u16 = 16;
const NUM_CHANNELS: u16 = 1;

/// PCM 编解码错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PcmError {
    #[error("No audio segments to concatenate")]
    NoSegments,

    #[error("Audio segment {index} too short: {len} bytes (header is {} bytes)", WAV_HEADER_LEN)]
    SegmentTooShort { index: usize, len: usize },

    #[error("Invalid WAV: {0}")]
    InvalidHeader(String),

    #[error("Unsupported WAV format: {0}")]
    UnsupportedFormat(String),
}

/// 解析后的 PCM 音频
#[derive(Debug, Clone, PartialEq)]
pub struct PcmAudio {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

/// 写入 44 字节 WAV 头
fn write_header(wav: &mut Vec<u8>, data_size: usize, sample_rate: u32) {
    let byte_rate = sample_rate * NUM_CHANNELS as u32 * (BITS_PER_SAMPLE / 8) as u32;
    let block_align = NUM_CHANNELS * (BITS_PER_SAMPLE / 8);

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&((36 + data_size) as u32).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&NUM_CHANNELS.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&(data_size as u32).to_le_bytes());
}

/// 由 i16 样本构建 WAV
///
/// 空输入得到仅含头部、data 大小为 0 的缓冲区
pub fn build(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let data_size = samples.len() * 2;
    let mut wav = Vec::with_capacity(WAV_HEADER_LEN + data_size);
    write_header(&mut wav, data_size, sample_rate);
    for sample in samples {
        wav.extend_from_slice(&sample.to_le_bytes());
    }
    wav
}

/// 由浮点样本构建 WAV（先截断到 [-1.0, 1.0]）
pub fn build_from_f32(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let pcm: Vec<i16> = samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0).round() as i16)
        .collect();
    build(&pcm, sample_rate)
}

/// 拼接多个 WAV 缓冲区
///
/// - 单个缓冲区原样返回
/// - 每段必须长于固定头长度
/// - 不校验各段采样率，新头部使用 `sample_rate`
pub fn concatenate(buffers: &[Vec<u8>], sample_rate: u32) -> Result<Vec<u8>, PcmError> {
    match buffers {
        [] => return Err(PcmError::NoSegments),
        [single] => return Ok(single.clone()),
        _ => {}
    }

    let mut payload_len = 0;
    for (index, buf) in buffers.iter().enumerate() {
        if buf.len() <= WAV_HEADER_LEN {
            return Err(PcmError::SegmentTooShort {
                index,
                len: buf.len(),
            });
        }
        payload_len += buf.len() - WAV_HEADER_LEN;
    }

    let mut wav = Vec::with_capacity(WAV_HEADER_LEN + payload_len);
    write_header(&mut wav, payload_len, sample_rate);
    for buf in buffers {
        wav.extend_from_slice(&buf[WAV_HEADER_LEN..]);
    }

    Ok(wav)
}

fn read_u16(data: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([data[pos], data[pos + 1]])
}

fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

/// 解析 16 位 PCM WAV
///
/// 遍历 RIFF chunk，容忍 fmt 与 data 之间的额外 chunk
pub fn parse(data: &[u8]) -> Result<PcmAudio, PcmError> {
    if data.len() < 12 {
        return Err(PcmError::InvalidHeader("data too short".to_string()));
    }
    if &data[0..4] != b"RIFF" {
        return Err(PcmError::InvalidHeader("missing RIFF header".to_string()));
    }
    if &data[8..12] != b"WAVE" {
        return Err(PcmError::InvalidHeader(
            "missing WAVE identifier".to_string(),
        ));
    }

    let mut pos = 12;
    let mut format: Option<(u16, u16, u32, u16)> = None;
    let mut payload: Option<&[u8]> = None;

    while pos + 8 <= data.len() {
        let chunk_id = &data[pos..pos + 4];
        let chunk_size = read_u32(data, pos + 4) as usize;
        let body_start = pos + 8;

        match chunk_id {
            b"fmt " => {
                if chunk_size < 16 || body_start + 16 > data.len() {
                    return Err(PcmError::InvalidHeader("invalid fmt chunk".to_string()));
                }
                format = Some((
                    read_u16(data, body_start),
                    read_u16(data, body_start + 2),
                    read_u32(data, body_start + 4),
                    read_u16(data, body_start + 14),
                ));
            }
            b"data" => {
                // 截断的 data chunk 取实际可用部分
                let end = (body_start + chunk_size).min(data.len());
                payload = Some(&data[body_start..end]);
                break;
            }
            _ => {}
        }

        pos = body_start + chunk_size;
        // 对齐到偶数字节
        if chunk_size % 2 != 0 {
            pos += 1;
        }
    }

    let (audio_format, channels, sample_rate, bits_per_sample) =
        format.ok_or_else(|| PcmError::InvalidHeader("missing fmt chunk".to_string()))?;
    let payload =
        payload.ok_or_else(|| PcmError::InvalidHeader("missing data chunk".to_string()))?;

    if audio_format != 1 || bits_per_sample != BITS_PER_SAMPLE {
        return Err(PcmError::UnsupportedFormat(format!(
            "format tag {}, {} bits per sample",
            audio_format, bits_per_sample
        )));
    }

    let samples = payload
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect();

    Ok(PcmAudio {
        sample_rate,
        channels,
        samples,
    })
}

/// 仅读取采样率（不解码样本）
pub fn sample_rate_of(data: &[u8]) -> Option<u32> {
    if data.len() < WAV_HEADER_LEN || &data[0..4] != b"RIFF" || &data[12..16] != b"fmt " {
        return None;
    }
    Some(read_u32(data, 24))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (i as f32 * 0.05).sin() * 0.8)
            .collect()
    }

    #[test]
    fn test_build_header_layout() {
        let wav = build(&[1, -1, 300], 24000);
        assert_eq!(wav.len(), WAV_HEADER_LEN + 6);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]), 36 + 6);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(u16::from_le_bytes([wav[20], wav[21]]), 1);
        assert_eq!(u16::from_le_bytes([wav[22], wav[23]]), 1);
        assert_eq!(u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]), 24000);
        assert_eq!(u32::from_le_bytes([wav[28], wav[29], wav[30], wav[31]]), 48000);
        assert_eq!(u16::from_le_bytes([wav[34], wav[35]]), 16);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 6);
        assert_eq!(&wav[44..46], &1i16.to_le_bytes());
    }

    #[test]
    fn test_empty_input_is_header_only() {
        let wav = build(&[], 16000);
        assert_eq!(wav.len(), WAV_HEADER_LEN);
        assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 0);

        let parsed = parse(&wav).unwrap();
        assert!(parsed.samples.is_empty());
        assert_eq!(parsed.sample_rate, 16000);
    }

    #[test]
    fn test_float_round_trip_within_quantization() {
        let samples = tone(2048);
        let parsed = parse(&build_from_f32(&samples, 22050)).unwrap();
        assert_eq!(parsed.sample_rate, 22050);
        assert_eq!(parsed.channels, 1);

        assert_eq!(parsed.samples.len(), samples.len());
        for (a, &b) in samples.iter().zip(parsed.samples.iter()) {
            assert!((a - b as f32 / 32767.0).abs() <= 1.0 / 32767.0 + 1e-6);
        }
    }

    #[test]
    fn test_concatenate_sizes() {
        let k = 3;
        let n = 500;
        let buffers: Vec<Vec<u8>> = (0..k).map(|_| build(&vec![7i16; n], 24000)).collect();

        let merged = concatenate(&buffers, 24000).unwrap();
        assert_eq!(merged.len(), WAV_HEADER_LEN + k * n * 2);
        // 只有一个头
        assert_eq!(merged.windows(4).filter(|w| *w == b"RIFF").count(), 1);

        let parsed = parse(&merged).unwrap();
        assert_eq!(parsed.samples.len(), k * n);
    }

    #[test]
    fn test_concatenate_preserves_order() {
        let a = build(&[1, 2], 24000);
        let b = build(&[3], 24000);
        let c = build(&[4, 5, 6], 24000);
        let merged = concatenate(&[a, b, c], 24000).unwrap();
        assert_eq!(parse(&merged).unwrap().samples, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_concatenate_single_is_identity() {
        let buf = build(&[10, 20, 30], 8000);
        assert_eq!(concatenate(&[buf.clone()], 24000).unwrap(), buf);
    }

    #[test]
    fn test_concatenate_rejects_short_segment() {
        let good = build(&[1, 2, 3], 24000);
        let header_only = build(&[], 24000);
        let err = concatenate(&[good, header_only], 24000).unwrap_err();
        assert_eq!(
            err,
            PcmError::SegmentTooShort {
                index: 1,
                len: WAV_HEADER_LEN
            }
        );
    }

    #[test]
    fn test_concatenate_requires_input() {
        assert_eq!(concatenate(&[], 24000).unwrap_err(), PcmError::NoSegments);
    }

    #[test]
    fn test_parse_skips_extra_chunks() {
        let plain = build(&[42, -42], 16000);
        let mut wav = plain[..36].to_vec();
        wav.extend_from_slice(b"LIST");
        wav.extend_from_slice(&3u32.to_le_bytes());
        wav.extend_from_slice(&[0, 0, 0, 0]); // 3 字节 + 1 字节对齐
        wav.extend_from_slice(&plain[36..]);

        let parsed = parse(&wav).unwrap();
        assert_eq!(parsed.samples, vec![42, -42]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse(b"not a wav file at all, definitely not").is_err());
        assert!(parse(b"RIFF").is_err());
    }

    #[test]
    fn test_sample_rate_of() {
        assert_eq!(sample_rate_of(&build(&[1], 44100)), Some(44100));
        assert_eq!(sample_rate_of(b"short"), None);
    }
}
