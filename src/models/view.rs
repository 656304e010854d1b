use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::document::{CandidateFile, FileId, LifecycleState, MediaType};
use crate::services::policy::Rejection;

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// A tracked document as shown in the uploaded-documents list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentView {
    pub id: FileId,
    pub name: String,
    pub size_bytes: u64,
    pub size_display: String,
    pub media_type: MediaType,
    pub format: String,
    pub state: LifecycleState,
    pub status_label: String,
    pub progress: f64,
    pub progress_display: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Only completed documents can be opened in the analysis viewer.
    pub can_analyze: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&CandidateFile> for DocumentView {
    fn from(file: &CandidateFile) -> Self {
        Self {
            id: file.id,
            name: file.source_name.clone(),
            size_bytes: file.source_size_bytes,
            size_display: format_file_size(file.source_size_bytes),
            media_type: file.source_media_type,
            format: file.source_media_type.label().to_string(),
            state: file.state,
            status_label: file.state.status_label().to_string(),
            progress: file.progress,
            progress_display: file.progress.round().clamp(0.0, 100.0) as u8,
            error: file.error.clone(),
            can_analyze: file.state == LifecycleState::Completed,
            created_at: file.created_at,
            updated_at: file.updated_at,
        }
    }
}

/// A file that did not pass validation, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectionView {
    pub name: String,
    pub size_bytes: u64,
    pub media_type: Option<String>,
    pub reason: String,
    pub message: String,
}

impl From<&Rejection> for RejectionView {
    fn from(rejection: &Rejection) -> Self {
        Self {
            name: rejection.file.name.clone(),
            size_bytes: rejection.file.size_bytes,
            media_type: rejection.file.declared_media_type(),
            reason: rejection.reason.code().to_string(),
            message: rejection.reason.to_string(),
        }
    }
}

/// Response after submitting a batch of documents.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub accepted: Vec<DocumentView>,
    #[serde(default)]
    pub rejected: Vec<RejectionView>,
}

/// Format a byte count the way the upload list shows it: base 1024,
/// at most two decimals, trailing zeros dropped.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    while unit + 1 < SIZE_UNITS.len() && bytes >= 1024u64.pow(unit as u32 + 1) {
        unit += 1;
    }

    let value = bytes as f64 / 1024f64.powi(unit as i32);
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}
