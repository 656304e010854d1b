use serde::{Deserialize, Serialize};

use crate::models::document::{FileId, LifecycleState};

/// Observable change to a tracked document: one of its timers fired, or it
/// stopped being tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// Progress advanced within the current phase.
    Progressed {
        id: FileId,
        state: LifecycleState,
        progress: f64,
    },
    /// Upload reached 100%; processing starts after the settle delay.
    UploadFinished { id: FileId },
    ProcessingStarted { id: FileId },
    Completed { id: FileId },
    /// No further events follow for this id.
    Removed { id: FileId },
}

impl LifecycleEvent {
    pub fn file_id(&self) -> FileId {
        match self {
            LifecycleEvent::Progressed { id, .. }
            | LifecycleEvent::UploadFinished { id }
            | LifecycleEvent::ProcessingStarted { id }
            | LifecycleEvent::Completed { id }
            | LifecycleEvent::Removed { id } => *id,
        }
    }
}
