use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Source of the current time, measured from an arbitrary origin.
///
/// All lifecycle deadlines are expressed on this timeline, so swapping the
/// clock is enough to run the state machine without real waits.
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

/// Clock backed by the tokio timer. Honors paused time in tests.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    /// Move to an absolute point on the timeline. Never goes backwards.
    pub fn set(&self, to: Duration) {
        let mut now = self.now.lock();
        if to > *now {
            *now = to;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let handle = clock.clone();

        handle.advance(Duration::from_millis(200));
        assert_eq!(clock.now(), Duration::from_millis(200));

        clock.set(Duration::from_millis(100));
        assert_eq!(handle.now(), Duration::from_millis(200));

        clock.set(Duration::from_secs(1));
        assert_eq!(handle.now(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_clock_follows_paused_time() {
        let clock = TokioClock::new();
        tokio::time::sleep(Duration::from_millis(500)).await;
        let now = clock.now();
        assert!(now >= Duration::from_millis(500));
        assert!(now < Duration::from_millis(502));
    }
}
