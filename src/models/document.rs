use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

/// Opaque identifier assigned to a document when it is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(Uuid);

impl FileId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for FileId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Document formats accepted for intake.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, EnumIter, Display,
)]
#[strum(ascii_case_insensitive)]
pub enum MediaType {
    #[serde(rename = "application/pdf")]
    #[strum(to_string = "application/pdf")]
    Pdf,

    #[serde(rename = "application/msword")]
    #[strum(to_string = "application/msword")]
    Doc,

    #[serde(rename = "application/vnd.openxmlformats-officedocument.wordprocessingml.document")]
    #[strum(to_string = "application/vnd.openxmlformats-officedocument.wordprocessingml.document")]
    Docx,

    #[serde(rename = "text/plain")]
    #[strum(to_string = "text/plain")]
    PlainText,
}

impl MediaType {
    /// Parse a declared content type, ignoring parameters such as `charset`.
    pub fn parse(declared: &str) -> Option<Self> {
        let essence = declared.split(';').next().unwrap_or_default().trim();
        Self::from_str(essence).ok()
    }

    /// Short format label shown next to a document.
    pub fn label(&self) -> &'static str {
        match self {
            MediaType::Pdf => "PDF",
            MediaType::Doc => "DOC",
            MediaType::Docx => "DOCX",
            MediaType::PlainText => "TXT",
        }
    }
}

/// Lifecycle state of a tracked document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LifecycleState {
    Uploading,
    Processing,
    Completed,
    Errored,
}

impl LifecycleState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Completed | LifecycleState::Errored)
    }

    /// True while the document still has simulated work ahead of it.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, LifecycleState::Uploading | LifecycleState::Processing)
    }

    /// Human-readable status line for the uploaded-documents list.
    pub fn status_label(&self) -> &'static str {
        match self {
            LifecycleState::Uploading => "Uploading...",
            LifecycleState::Processing => "Processing with AI...",
            LifecycleState::Completed => "Ready for analysis",
            LifecycleState::Errored => "Upload failed",
        }
    }
}

/// A file as submitted by a client, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFile {
    pub name: String,
    pub size_bytes: u64,
    /// Content type declared by the client, if any.
    pub media_type: Option<String>,
}

impl RawFile {
    pub fn new(name: impl Into<String>, size_bytes: u64, media_type: Option<&str>) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            media_type: media_type.map(str::to_owned),
        }
    }

    /// The declared content type, or a guess from the file extension when
    /// the client sent none (as a browser does when filling in `File.type`).
    pub fn declared_media_type(&self) -> Option<String> {
        match self.media_type.as_deref().map(str::trim) {
            Some(declared) if !declared.is_empty() => Some(declared.to_string()),
            _ => mime_guess::from_path(&self.name)
                .first_raw()
                .map(str::to_owned),
        }
    }
}

/// A document accepted by validation and tracked through the intake lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateFile {
    pub id: FileId,
    pub source_name: String,
    pub source_size_bytes: u64,
    pub source_media_type: MediaType,
    pub state: LifecycleState,
    /// Percent complete for the current phase, in `[0, 100]`.
    pub progress: f64,
    /// Only set when `state` is `Errored`.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CandidateFile {
    /// Start tracking an accepted file in the `Uploading` state.
    pub fn accept(raw: RawFile, media_type: MediaType) -> Self {
        let now = Utc::now();
        Self {
            id: FileId::new(),
            source_name: raw.name,
            source_size_bytes: raw.size_bytes,
            source_media_type: media_type,
            state: LifecycleState::Uploading,
            progress: 0.0,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}
