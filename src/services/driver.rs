use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::error::IntakeError;
use crate::models::document::{CandidateFile, FileId, RawFile};
use crate::models::event::LifecycleEvent;
use crate::services::engine::{AnalysisLink, IntakeEngine, SubmitOutcome};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Counts reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakeStats {
    pub tracked: usize,
    pub in_flight: usize,
}

/// Runs an [`IntakeEngine`] on the tokio timer.
///
/// A background task sleeps until the engine's next deadline, fires due
/// timers and publishes the resulting events. Submissions and removals wake
/// it so the schedule is recomputed.
pub struct IntakeService {
    engine: Arc<Mutex<IntakeEngine>>,
    wake: Arc<Notify>,
    events: broadcast::Sender<LifecycleEvent>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl IntakeService {
    /// Spawn the driver task. Must be called from within a tokio runtime.
    pub fn start(engine: IntakeEngine) -> Self {
        let engine = Arc::new(Mutex::new(engine));
        let wake = Arc::new(Notify::new());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let task = tokio::spawn(run_driver(engine.clone(), wake.clone(), events.clone()));
        tracing::info!("Intake driver started");

        Self {
            engine,
            wake,
            events,
            task: Mutex::new(Some(task)),
        }
    }

    /// Validate and start tracking a batch of files.
    pub fn submit(&self, files: Vec<RawFile>) -> SubmitOutcome {
        let (outcome, in_flight) = {
            let mut engine = self.engine.lock();
            let outcome = engine.submit(files);
            (outcome, engine.in_flight())
        };

        metrics::counter!("intake_files_accepted_total").increment(outcome.accepted.len() as u64);
        for rejection in &outcome.rejected {
            metrics::counter!("intake_files_rejected_total", "reason" => rejection.reason.code())
                .increment(1);
        }
        metrics::gauge!("intake_files_in_flight").set(in_flight as f64);

        if !outcome.accepted.is_empty() {
            self.wake.notify_one();
        }
        outcome
    }

    /// Stop tracking a document and cancel its pending timer.
    ///
    /// Subscribers receive [`LifecycleEvent::Removed`] after every earlier
    /// event for the document and nothing for it afterwards.
    pub fn remove(&self, id: &FileId) -> Result<CandidateFile, IntakeError> {
        let (removed, in_flight) = {
            let mut engine = self.engine.lock();
            let removed = engine.remove(id).ok_or(IntakeError::NotFound(*id))?;
            let _ = self.events.send(LifecycleEvent::Removed { id: *id });
            (removed, engine.in_flight())
        };

        metrics::counter!("intake_files_removed_total").increment(1);
        metrics::gauge!("intake_files_in_flight").set(in_flight as f64);
        self.wake.notify_one();
        Ok(removed)
    }

    pub fn get(&self, id: &FileId) -> Result<CandidateFile, IntakeError> {
        self.engine
            .lock()
            .get(id)
            .cloned()
            .ok_or(IntakeError::NotFound(*id))
    }

    pub fn list(&self) -> Vec<CandidateFile> {
        self.engine.lock().list()
    }

    pub fn analysis_link(&self, id: &FileId) -> Result<AnalysisLink, IntakeError> {
        self.engine.lock().analysis_link(id)
    }

    pub fn stats(&self) -> IntakeStats {
        let engine = self.engine.lock();
        IntakeStats {
            tracked: engine.len(),
            in_flight: engine.in_flight(),
        }
    }

    /// Receive lifecycle events fired after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    /// Stop the driver task. Tracked documents stop advancing.
    pub fn shutdown(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
            tracing::info!("Intake driver stopped");
        }
    }
}

impl Drop for IntakeService {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

async fn run_driver(
    engine: Arc<Mutex<IntakeEngine>>,
    wake: Arc<Notify>,
    events: broadcast::Sender<LifecycleEvent>,
) {
    loop {
        let wait = {
            let engine = engine.lock();
            engine
                .next_deadline()
                .map(|deadline| deadline.saturating_sub(engine.now()))
        };

        match wait {
            Some(delay) => {
                tokio::select! {
                    _ = sleep(delay) => {}
                    _ = wake.notified() => continue,
                }
            }
            None => {
                tracing::trace!("No pending timers, waiting for submissions");
                wake.notified().await;
                continue;
            }
        }

        // Events go out before the lock is released so a concurrent remove
        // cannot slip in between a timer firing and its event
        let (fired, completed, in_flight) = {
            let mut engine = engine.lock();
            let (fired, completed) = publish(&events, engine.poll());
            (fired, completed, engine.in_flight())
        };

        if fired == 0 {
            continue;
        }
        if completed > 0 {
            metrics::counter!("intake_files_completed_total").increment(completed as u64);
        }
        metrics::gauge!("intake_files_in_flight").set(in_flight as f64);
    }
}

/// Broadcast fired events. Returns how many were sent and how many completed
/// a document.
fn publish(
    events: &broadcast::Sender<LifecycleEvent>,
    fired: Vec<LifecycleEvent>,
) -> (usize, usize) {
    let total = fired.len();
    let mut completed = 0;
    for event in fired {
        if matches!(event, LifecycleEvent::Completed { .. }) {
            completed += 1;
        }
        // No subscribers is fine
        let _ = events.send(event);
    }
    (total, completed)
}
