//! Data Transfer Objects

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::application::{ClonePromptCacheStats, DeleteVoiceResponse, ImportVoiceResponse};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Voice DTOs
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct GetVoiceRequest {
    /// 为空时返回默认音色
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DesignVoiceRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteVoiceRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteVoiceResult {
    pub deleted: bool,
    pub cache_files_removed: usize,
}

impl From<DeleteVoiceResponse> for DeleteVoiceResult {
    fn from(r: DeleteVoiceResponse) -> Self {
        Self {
            deleted: r.deleted,
            cache_files_removed: r.cache_files_removed,
        }
    }
}

// ============================================================================
// Synthesis DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    pub text: String,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub model_variant: Option<String>,
    /// 原样传给合成后端
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

// ============================================================================
// Container DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ExportVoiceRequest {
    pub name: String,
    #[serde(default)]
    pub model_variant: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImportVoiceResult {
    pub name: String,
    pub kind: &'static str,
    pub supported_model_variants: Vec<String>,
    pub clone_prompt_seeded: bool,
}

impl From<ImportVoiceResponse> for ImportVoiceResult {
    fn from(r: ImportVoiceResponse) -> Self {
        Self {
            name: r.name,
            kind: r.kind,
            supported_model_variants: r.supported_model_variants,
            clone_prompt_seeded: r.clone_prompt_seeded,
        }
    }
}

// ============================================================================
// Ping DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    pub memory_entries: usize,
    pub memory_hits: u64,
    pub model_disk_hits: u64,
    pub legacy_disk_hits: u64,
    pub container_extractions: u64,
    pub cold_derivations: u64,
}

impl From<ClonePromptCacheStats> for CacheStatsResponse {
    fn from(s: ClonePromptCacheStats) -> Self {
        Self {
            memory_entries: s.memory_entries,
            memory_hits: s.memory_hits,
            model_disk_hits: s.model_disk_hits,
            legacy_disk_hits: s.legacy_disk_hits,
            container_extractions: s.container_extractions,
            cold_derivations: s.cold_derivations,
        }
    }
}
