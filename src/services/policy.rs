use serde::Serialize;
use strum::IntoEnumIterator;

use crate::models::document::{MediaType, RawFile};

/// Largest document accepted for intake: 10 MiB, inclusive.
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Why a submitted file was left out of the accepted batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    #[error("Unsupported media type: {declared}")]
    UnsupportedMediaType { declared: String },

    #[error("File is {size_bytes} bytes, limit is {limit_bytes} bytes")]
    TooLarge { size_bytes: u64, limit_bytes: u64 },
}

impl RejectionReason {
    /// Stable short code, used as a metrics label.
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::UnsupportedMediaType { .. } => "unsupported_media_type",
            RejectionReason::TooLarge { .. } => "too_large",
        }
    }
}

/// A file dropped by validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub file: RawFile,
    pub reason: RejectionReason,
}

/// Media-type allow-list and size ceiling applied at submission time.
#[derive(Debug, Clone)]
pub struct ValidationPolicy {
    allowed: Vec<MediaType>,
    max_size_bytes: u64,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self::new(MAX_FILE_BYTES)
    }
}

impl ValidationPolicy {
    /// Policy accepting every supported document format up to `max_size_bytes`.
    pub fn new(max_size_bytes: u64) -> Self {
        Self {
            allowed: MediaType::iter().collect(),
            max_size_bytes,
        }
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    pub fn allows(&self, media_type: MediaType) -> bool {
        self.allowed.contains(&media_type)
    }

    /// Check a single file. The media type is checked before the size.
    pub fn check(&self, file: &RawFile) -> Result<MediaType, RejectionReason> {
        let declared = file.declared_media_type().unwrap_or_default();
        let media_type = MediaType::parse(&declared)
            .filter(|media_type| self.allows(*media_type))
            .ok_or_else(|| RejectionReason::UnsupportedMediaType {
                declared: declared.clone(),
            })?;

        if file.size_bytes > self.max_size_bytes {
            return Err(RejectionReason::TooLarge {
                size_bytes: file.size_bytes,
                limit_bytes: self.max_size_bytes,
            });
        }

        Ok(media_type)
    }

    /// Split a batch into accepted files (submission order kept) and rejections.
    pub fn partition(&self, files: Vec<RawFile>) -> (Vec<(RawFile, MediaType)>, Vec<Rejection>) {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();

        for file in files {
            match self.check(&file) {
                Ok(media_type) => accepted.push((file, media_type)),
                Err(reason) => rejected.push(Rejection { file, reason }),
            }
        }

        (accepted, rejected)
    }
}
