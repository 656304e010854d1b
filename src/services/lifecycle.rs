use chrono::Utc;
use std::fmt;
use std::time::Duration;

use crate::models::document::{CandidateFile, LifecycleState};
use crate::models::event::LifecycleEvent;
use crate::services::progress::{DeltaSource, Phase};

/// Upload-phase tick interval.
pub const UPLOAD_TICK: Duration = Duration::from_millis(200);

/// Processing-phase tick interval.
pub const PROCESSING_TICK: Duration = Duration::from_millis(500);

/// Pause between upload reaching 100% and processing starting.
pub const SETTLE_DELAY: Duration = Duration::from_millis(1000);

/// Largest progress increment per upload tick.
pub const UPLOAD_MAX_DELTA: f64 = 30.0;

/// Largest progress increment per processing tick.
pub const PROCESSING_MAX_DELTA: f64 = 25.0;

const COMPLETE: f64 = 100.0;

/// Intervals and increment ceilings driving the simulated lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Timing {
    pub upload_tick: Duration,
    pub processing_tick: Duration,
    pub settle_delay: Duration,
    pub upload_max_delta: f64,
    pub processing_max_delta: f64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            upload_tick: UPLOAD_TICK,
            processing_tick: PROCESSING_TICK,
            settle_delay: SETTLE_DELAY,
            upload_max_delta: UPLOAD_MAX_DELTA,
            processing_max_delta: PROCESSING_MAX_DELTA,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Periodic upload progress tick.
    UploadTick,
    /// One-shot move from finished upload into processing.
    Settle,
    /// Periodic processing progress tick.
    ProcessingTick,
}

/// The single pending timer of a tracked document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub kind: TimerKind,
    pub deadline: Duration,
    /// Arm order, breaks ties between timers sharing a deadline.
    pub seq: u64,
}

/// A document in the registry together with its pending timer and the
/// increment stream only it draws from.
pub struct TrackedFile {
    pub file: CandidateFile,
    pub timer: Option<Timer>,
    pub deltas: Box<dyn DeltaSource>,
}

impl fmt::Debug for TrackedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedFile")
            .field("file", &self.file)
            .field("timer", &self.timer)
            .finish_non_exhaustive()
    }
}

/// Result of firing a timer: what happened and which timer to arm next.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired {
    pub event: LifecycleEvent,
    pub next: Option<(TimerKind, Duration)>,
}

/// Apply one timer to one document.
///
/// Periodic timers re-arm relative to their own deadline so late polling
/// does not stretch the schedule. Returns `None` when the timer no longer
/// matches the document's state; such a timer is dropped.
pub fn fire(
    file: &mut CandidateFile,
    kind: TimerKind,
    deadline: Duration,
    timing: &Timing,
    deltas: &mut dyn DeltaSource,
) -> Option<Fired> {
    let fired = match (kind, file.state) {
        (TimerKind::UploadTick, LifecycleState::Uploading) => {
            let delta = deltas.next_delta(Phase::Upload, timing.upload_max_delta);
            let progress = (file.progress + delta).min(COMPLETE);

            if progress >= COMPLETE {
                file.progress = COMPLETE;
                Fired {
                    event: LifecycleEvent::UploadFinished { id: file.id },
                    next: Some((TimerKind::Settle, deadline + timing.settle_delay)),
                }
            } else {
                file.progress = progress;
                Fired {
                    event: LifecycleEvent::Progressed {
                        id: file.id,
                        state: file.state,
                        progress,
                    },
                    next: Some((TimerKind::UploadTick, deadline + timing.upload_tick)),
                }
            }
        }
        (TimerKind::Settle, LifecycleState::Uploading) => {
            file.state = LifecycleState::Processing;
            file.progress = 0.0;
            Fired {
                event: LifecycleEvent::ProcessingStarted { id: file.id },
                next: Some((TimerKind::ProcessingTick, deadline + timing.processing_tick)),
            }
        }
        (TimerKind::ProcessingTick, LifecycleState::Processing) => {
            let delta = deltas.next_delta(Phase::Processing, timing.processing_max_delta);
            let progress = (file.progress + delta).min(COMPLETE);

            if progress >= COMPLETE {
                file.state = LifecycleState::Completed;
                file.progress = COMPLETE;
                Fired {
                    event: LifecycleEvent::Completed { id: file.id },
                    next: None,
                }
            } else {
                file.progress = progress;
                Fired {
                    event: LifecycleEvent::Progressed {
                        id: file.id,
                        state: file.state,
                        progress,
                    },
                    next: Some((TimerKind::ProcessingTick, deadline + timing.processing_tick)),
                }
            }
        }
        _ => return None,
    };

    file.updated_at = Utc::now();
    Some(fired)
}
