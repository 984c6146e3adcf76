//! Reference Audio Loader - 基于 symphonia 的参考音频读取
//!
//! 16 位单声道 PCM WAV 原样返回；其它格式解码、下混为单声道后重新编码

use async_trait::async_trait;
use std::io::Cursor;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tokio::fs;

use crate::application::ports::{ReferenceAudioError, ReferenceAudioPort};
use crate::domain::pcm;

/// 解码后的交错 f32 样本
struct DecodedAudio {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: usize,
}

impl DecodedAudio {
    fn downmix(&self) -> Vec<f32> {
        if self.channels <= 1 {
            return self.samples.clone();
        }
        self.samples
            .chunks(self.channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    }
}

/// symphonia 参考音频读取器
#[derive(Debug, Default, Clone)]
pub struct SymphoniaReferenceLoader;

impl SymphoniaReferenceLoader {
    pub fn new() -> Self {
        Self
    }

    /// 原样可用：16 位单声道 PCM
    fn is_normalized(data: &[u8]) -> bool {
        matches!(pcm::parse(data), Ok(audio) if audio.channels == 1)
    }

    fn decode(data: Vec<u8>, extension: Option<String>) -> Result<DecodedAudio, ReferenceAudioError> {
        let err = |msg: String| ReferenceAudioError::DecodingError(msg);

        let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());
        let mut hint = Hint::new();
        if let Some(ext) = extension.as_deref() {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| err(format!("Probe failed: {}", e)))?;
        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| err("No audio track found".to_string()))?;
        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate;
        let mut channels = track.codec_params.channels.map(|c| c.count());

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| err(format!("Decoder creation failed: {}", e)))?;

        let mut samples: Vec<f32> = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(symphonia::core::errors::Error::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => return Err(err(format!("Packet read error: {}", e))),
            };
            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(symphonia::core::errors::Error::DecodeError(e)) => {
                    tracing::warn!("Decode error (skipping packet): {}", e);
                    continue;
                }
                Err(e) => return Err(err(format!("Decode failed: {}", e))),
            };

            let spec = *decoded.spec();
            sample_rate.get_or_insert(spec.rate);
            channels.get_or_insert(spec.channels.count());

            let frames = decoded.frames();
            let mut buf = SampleBuffer::<f32>::new(frames as u64, spec);
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(&buf.samples()[..frames * spec.channels.count()]);
        }

        let sample_rate = sample_rate.ok_or_else(|| err("Unknown sample rate".to_string()))?;
        let channels = channels.ok_or_else(|| err("Unknown channel count".to_string()))?;
        if samples.is_empty() {
            return Err(err("No audio samples decoded".to_string()));
        }

        Ok(DecodedAudio {
            samples,
            sample_rate,
            channels,
        })
    }
}

#[async_trait]
impl ReferenceAudioPort for SymphoniaReferenceLoader {
    async fn load(&self, path: &Path) -> Result<Vec<u8>, ReferenceAudioError> {
        let data = match fs::read(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ReferenceAudioError::NotFound(path.display().to_string()));
            }
            Err(e) => return Err(ReferenceAudioError::IoError(e.to_string())),
        };

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        tracing::debug!(path = %path.display(), size = data.len(), "Reference audio read");
        self.normalize(data, extension.as_deref()).await
    }

    async fn normalize(
        &self,
        data: Vec<u8>,
        extension: Option<&str>,
    ) -> Result<Vec<u8>, ReferenceAudioError> {
        if Self::is_normalized(&data) {
            return Ok(data);
        }

        let extension = extension.map(|e| e.trim_start_matches('.').to_lowercase());
        let decoded = tokio::task::spawn_blocking(move || Self::decode(data, extension))
            .await
            .map_err(|e| ReferenceAudioError::DecodingError(e.to_string()))??;

        let mono = decoded.downmix();
        tracing::debug!(
            sample_rate = decoded.sample_rate,
            channels = decoded.channels,
            frames = mono.len(),
            "Reference audio normalized"
        );
        Ok(pcm::build_from_f32(&mono, decoded.sample_rate))
    }
}

/// 16 位立体声 WAV
#[cfg(test)]
pub(crate) fn stereo_wav(frames: &[(i16, i16)], sample_rate: u32) -> Vec<u8> {
    let data_size = frames.len() * 4;
    let mut wav = Vec::new();
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&((36 + data_size) as u32).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&(sample_rate * 4).to_le_bytes());
    wav.extend_from_slice(&4u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&(data_size as u32).to_le_bytes());
    for (l, r) in frames {
        wav.extend_from_slice(&l.to_le_bytes());
        wav.extend_from_slice(&r.to_le_bytes());
    }
    wav
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_mono_pcm16_passes_through() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ref.wav");
        let wav = pcm::build(&[0, 100, -100, 32767], 16000);
        std::fs::write(&path, &wav).unwrap();

        let loaded = SymphoniaReferenceLoader::new().load(&path).await.unwrap();
        assert_eq!(loaded, wav);
    }

    #[tokio::test]
    async fn test_stereo_is_downmixed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let frames: Vec<(i16, i16)> = (0..480).map(|i| (i as i16 * 10, i as i16 * 10)).collect();
        std::fs::write(&path, stereo_wav(&frames, 24000)).unwrap();

        let loaded = SymphoniaReferenceLoader::new().load(&path).await.unwrap();
        let audio = pcm::parse(&loaded).unwrap();
        assert_eq!(audio.channels, 1);
        assert_eq!(audio.sample_rate, 24000);
        assert_eq!(audio.samples.len(), 480);
        assert!((audio.samples[100] - 1000).abs() <= 1);
    }

    #[tokio::test]
    async fn test_normalize_in_memory_matches_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let frames: Vec<(i16, i16)> = (0..240).map(|i| (i as i16, -(i as i16))).collect();
        let wav = stereo_wav(&frames, 16000);
        std::fs::write(&path, &wav).unwrap();

        let loader = SymphoniaReferenceLoader::new();
        let from_file = loader.load(&path).await.unwrap();
        let from_bytes = loader.normalize(wav, Some(".WAV")).await.unwrap();
        assert_eq!(from_file, from_bytes);
        assert_eq!(from_bytes.len(), pcm::WAV_HEADER_LEN + 240 * 2);

        let mono = pcm::build(&[1, 2, 3], 16000);
        assert_eq!(loader.normalize(mono.clone(), None).await.unwrap(), mono);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let result = SymphoniaReferenceLoader::new()
            .load(&dir.path().join("absent.wav"))
            .await;
        assert!(matches!(result, Err(ReferenceAudioError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_garbage_fails_to_decode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("noise.mp3");
        std::fs::write(&path, vec![0u8; 64]).unwrap();

        let result = SymphoniaReferenceLoader::new().load(&path).await;
        assert!(matches!(result, Err(ReferenceAudioError::DecodingError(_))));
    }
}
