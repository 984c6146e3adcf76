//! 音色归档的 ZIP 编解码
//!
//! 纯内存转换，不做文件 IO。更新时未改动的条目按原始压缩字节复制

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::application::ports::{ContainerError, ImportedVoice};
use crate::domain::container::paths::{
    clone_prompt_path, reference_path, sample_audio_path, variant_slug_of, MANIFEST_PATH,
    REFERENCE_PREFIX,
};
use crate::domain::container::{ContainerManifest, FORMAT_VERSION};
use crate::domain::voice::{ClonePromptBlob, ModelVariant};

fn file_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

fn open(bytes: &[u8]) -> zip::result::ZipResult<ZipArchive<Cursor<&[u8]>>> {
    ZipArchive::new(Cursor::new(bytes))
}

fn read_entry<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>, String> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.to_string()),
    };
    let mut buf = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut buf)
        .map_err(|e| format!("{}: {}", name, e))?;
    Ok(Some(buf))
}

fn read_manifest<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<ContainerManifest, String> {
    let bytes = read_entry(archive, MANIFEST_PATH)?
        .ok_or_else(|| format!("missing {}", MANIFEST_PATH))?;
    let manifest: ContainerManifest =
        serde_json::from_slice(&bytes).map_err(|e| format!("invalid manifest: {}", e))?;
    if manifest.format_version == 0 || manifest.format_version > FORMAT_VERSION {
        return Err(format!(
            "unsupported format version {} (supported up to {})",
            manifest.format_version, FORMAT_VERSION
        ));
    }
    Ok(manifest)
}

/// 新建归档
pub fn export_archive(
    manifest: &ContainerManifest,
    clone_prompt: Option<(&ModelVariant, &ClonePromptBlob)>,
    sample_audio: Option<&[u8]>,
    reference_audio: &[(String, Vec<u8>)],
) -> Result<Vec<u8>, ContainerError> {
    let err = |e: String| ContainerError::ExportFailed(e);

    let manifest_json = serde_json::to_vec_pretty(manifest).map_err(|e| err(e.to_string()))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    let mut put = |path: &str, data: &[u8]| -> Result<(), ContainerError> {
        writer
            .start_file(path, file_options())
            .map_err(|e| err(e.to_string()))?;
        writer.write_all(data).map_err(|e| err(e.to_string()))
    };

    put(MANIFEST_PATH, &manifest_json)?;
    if let Some((variant, blob)) = clone_prompt {
        put(
            &clone_prompt_path(&manifest.provenance.engine, variant),
            blob.as_bytes(),
        )?;
    }
    if let Some(sample) = sample_audio {
        put(&sample_audio_path(&manifest.provenance.engine), sample)?;
    }
    for (file_name, data) in reference_audio {
        put(&reference_path(file_name), data)?;
    }

    let cursor = writer.finish().map_err(|e| err(e.to_string()))?;
    Ok(cursor.into_inner())
}

/// 解析归档，失败时不返回任何部分结果
pub fn import_archive(
    bytes: &[u8],
    variant: &ModelVariant,
) -> Result<ImportedVoice, ContainerError> {
    let fail = |e: String| ContainerError::ImportFailed(e);

    let mut archive = open(bytes).map_err(|e| fail(e.to_string()))?;
    let manifest = read_manifest(&mut archive).map_err(fail)?;
    let engine = manifest.provenance.engine.clone();
    let sample_path = sample_audio_path(&engine);
    let wanted_slug = variant.slug();

    let mut supported_model_variants = Vec::new();
    let mut clone_prompt = None;
    let mut sample_audio = None;
    let mut reference_audio = BTreeMap::new();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(|e| fail(e.to_string()))?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        let mut buf = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buf)
            .map_err(|e| fail(format!("{}: {}", name, e)))?;

        if let Some(slug) = variant_slug_of(&name, &engine) {
            if slug == wanted_slug {
                clone_prompt = Some(ClonePromptBlob::from(buf));
            }
            supported_model_variants.push(slug);
        } else if name == sample_path {
            sample_audio = Some(buf);
        } else if let Some(file_name) = name.strip_prefix(REFERENCE_PREFIX) {
            if !file_name.is_empty() {
                reference_audio.insert(file_name.to_string(), buf);
            }
        }
    }
    supported_model_variants.sort();

    Ok(ImportedVoice {
        manifest,
        supported_model_variants,
        clone_prompt,
        sample_audio,
        reference_audio,
    })
}

/// 读取归档清单
pub fn manifest_of(bytes: &[u8]) -> Result<ContainerManifest, ContainerError> {
    let mut archive = open(bytes).map_err(|e| ContainerError::ImportFailed(e.to_string()))?;
    read_manifest(&mut archive).map_err(ContainerError::ImportFailed)
}

/// 写入/替换单个条目，其余条目原样复制
pub fn replace_entry(bytes: &[u8], path: &str, data: &[u8]) -> Result<Vec<u8>, ContainerError> {
    let fail = |e: String| ContainerError::UpdateFailed(e);

    let mut archive = open(bytes).map_err(|e| fail(e.to_string()))?;
    // 清单不可读的归档不做更新
    read_manifest(&mut archive).map_err(fail)?;

    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(bytes.len() + data.len())));
    for i in 0..archive.len() {
        let file = archive.by_index_raw(i).map_err(|e| fail(e.to_string()))?;
        if file.name() == path {
            continue;
        }
        writer.raw_copy_file(file).map_err(|e| fail(e.to_string()))?;
    }

    writer
        .start_file(path, file_options())
        .map_err(|e| fail(e.to_string()))?;
    writer.write_all(data).map_err(|e| fail(e.to_string()))?;

    let cursor = writer.finish().map_err(|e| fail(e.to_string()))?;
    Ok(cursor.into_inner())
}

/// 替换该变体的 clone prompt
pub fn replace_clone_prompt(
    bytes: &[u8],
    blob: &ClonePromptBlob,
    variant: &ModelVariant,
) -> Result<Vec<u8>, ContainerError> {
    let engine = manifest_of(bytes)
        .map_err(|e| ContainerError::UpdateFailed(e.to_string()))?
        .provenance
        .engine;
    replace_entry(bytes, &clone_prompt_path(&engine, variant), blob.as_bytes())
}

/// 替换样本音频
pub fn replace_sample_audio(bytes: &[u8], sample: &[u8]) -> Result<Vec<u8>, ContainerError> {
    let engine = manifest_of(bytes)
        .map_err(|e| ContainerError::UpdateFailed(e.to_string()))?
        .provenance
        .engine;
    replace_entry(bytes, &sample_audio_path(&engine), sample)
}
