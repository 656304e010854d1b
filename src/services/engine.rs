use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::IntakeError;
use crate::models::document::{CandidateFile, FileId, LifecycleState, RawFile};
use crate::models::event::LifecycleEvent;
use crate::services::clock::Clock;
use crate::services::lifecycle::{self, Timer, TimerKind, Timing, TrackedFile};
use crate::services::policy::{Rejection, ValidationPolicy};
use crate::services::progress::DeltaStreams;
use crate::services::registry::Registry;

/// Default location of the analysis viewer.
pub const ANALYSIS_BASE_PATH: &str = "/analysis";

/// Result of submitting a batch: what entered the registry and what was dropped.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub accepted: Vec<CandidateFile>,
    pub rejected: Vec<Rejection>,
}

/// Hand-off to the analysis viewer. Only the display name is passed along.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisLink {
    pub file_name: String,
    pub location: String,
}

/// Intake state machine: validates submissions and drives every accepted
/// document through `Uploading -> Processing -> Completed` on its own timer.
///
/// The engine never sleeps. Callers advance it with [`IntakeEngine::poll`],
/// which fires every timer due at the clock's current time.
pub struct IntakeEngine {
    policy: ValidationPolicy,
    timing: Timing,
    analysis_base: String,
    registry: Registry,
    clock: Box<dyn Clock>,
    deltas: Box<dyn DeltaStreams>,
    next_seq: u64,
    next_stream: u64,
}

impl IntakeEngine {
    /// Engine with the default policy, timing and analysis location.
    pub fn new(clock: Box<dyn Clock>, deltas: Box<dyn DeltaStreams>) -> Self {
        Self {
            policy: ValidationPolicy::default(),
            timing: Timing::default(),
            analysis_base: ANALYSIS_BASE_PATH.to_string(),
            registry: Registry::new(),
            clock,
            deltas,
            next_seq: 0,
            next_stream: 0,
        }
    }

    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_analysis_base(mut self, base: impl Into<String>) -> Self {
        self.analysis_base = base.into();
        self
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Validate a batch and start tracking every accepted file.
    ///
    /// Rejected files never enter the registry; they are only reported back.
    pub fn submit(&mut self, files: Vec<RawFile>) -> SubmitOutcome {
        let now = self.clock.now();
        let (valid, rejected) = self.policy.partition(files);

        let mut accepted = Vec::with_capacity(valid.len());
        for (raw, media_type) in valid {
            let file = CandidateFile::accept(raw, media_type);
            let timer = self.arm(TimerKind::UploadTick, now + self.timing.upload_tick);
            let deltas = self.deltas.stream(self.next_stream);
            self.next_stream += 1;

            info!(
                file_id = %file.id,
                file_name = %file.source_name,
                size_bytes = file.source_size_bytes,
                media_type = %file.source_media_type,
                "Document accepted for intake"
            );

            self.registry.insert(TrackedFile {
                file: file.clone(),
                timer: Some(timer),
                deltas,
            });
            accepted.push(file);
        }

        for rejection in &rejected {
            info!(
                file_name = %rejection.file.name,
                size_bytes = rejection.file.size_bytes,
                reason = rejection.reason.code(),
                "Document rejected by validation"
            );
        }

        SubmitOutcome { accepted, rejected }
    }

    /// Stop tracking a document. Its pending timer goes with it.
    pub fn remove(&mut self, id: &FileId) -> Option<CandidateFile> {
        let removed = self.registry.remove(id)?;
        debug!(
            file_id = %id,
            state = %removed.file.state,
            had_timer = removed.timer.is_some(),
            "Document removed"
        );
        Some(removed.file)
    }

    pub fn get(&self, id: &FileId) -> Option<&CandidateFile> {
        self.registry.get(id).map(|tracked| &tracked.file)
    }

    /// Snapshot of all tracked documents in submission order.
    pub fn list(&self) -> Vec<CandidateFile> {
        self.registry.iter().map(|tracked| tracked.file.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Documents still uploading or processing.
    pub fn in_flight(&self) -> usize {
        self.registry
            .iter()
            .filter(|tracked| tracked.file.state.is_in_flight())
            .count()
    }

    /// Earliest pending timer deadline, if any document has work left.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.registry
            .iter()
            .filter_map(|tracked| tracked.timer.map(|timer| timer.deadline))
            .min()
    }

    /// Fire every timer due at the current time, oldest deadline first.
    ///
    /// Timers re-armed while polling fire too if they are already due, so a
    /// late poll catches up in order.
    pub fn poll(&mut self) -> Vec<LifecycleEvent> {
        let now = self.clock.now();
        let mut events = Vec::new();

        while let Some((id, timer)) = self.next_due(now) {
            let timing = &self.timing;
            let next_seq = &mut self.next_seq;

            self.registry.update(&id, |tracked| {
                tracked.timer = None;
                let Some(fired) = lifecycle::fire(
                    &mut tracked.file,
                    timer.kind,
                    timer.deadline,
                    timing,
                    tracked.deltas.as_mut(),
                ) else {
                    return;
                };

                tracked.timer = fired.next.map(|(kind, deadline)| {
                    let seq = *next_seq;
                    *next_seq += 1;
                    Timer { kind, deadline, seq }
                });
                events.push(fired.event);
            });
        }

        for event in &events {
            match event {
                LifecycleEvent::Completed { id } => {
                    info!(file_id = %id, "Document ready for analysis")
                }
                LifecycleEvent::ProcessingStarted { id } => {
                    debug!(file_id = %id, "Processing started")
                }
                _ => {}
            }
        }

        events
    }

    /// Link to the analysis viewer for a completed document.
    pub fn analysis_link(&self, id: &FileId) -> Result<AnalysisLink, IntakeError> {
        let file = self.get(id).ok_or(IntakeError::NotFound(*id))?;
        if file.state != LifecycleState::Completed {
            return Err(IntakeError::NotReady {
                id: *id,
                state: file.state,
            });
        }

        Ok(AnalysisLink {
            file_name: file.source_name.clone(),
            location: format!(
                "{}?file={}",
                self.analysis_base,
                encode_uri_component(&file.source_name)
            ),
        })
    }

    fn arm(&mut self, kind: TimerKind, deadline: Duration) -> Timer {
        let seq = self.next_seq;
        self.next_seq += 1;
        Timer { kind, deadline, seq }
    }

    fn next_due(&self, now: Duration) -> Option<(FileId, Timer)> {
        self.registry
            .iter()
            .filter_map(|tracked| tracked.timer.map(|timer| (tracked.file.id, timer)))
            .filter(|(_, timer)| timer.deadline <= now)
            .min_by_key(|(_, timer)| (timer.deadline, timer.seq))
    }
}

/// Percent-encode a query value the way browsers' `encodeURIComponent`
/// does: `! ' ( ) *` stay literal on top of the unreserved set.
fn encode_uri_component(value: &str) -> String {
    urlencoding::encode(value)
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
}
