use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use strum::Display;

/// Phase of the simulated lifecycle a progress increment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Upload,
    Processing,
}

/// Supplies the progress increment applied on each tick.
///
/// Implementations must return a value in `(0, max]`.
pub trait DeltaSource: Send {
    fn next_delta(&mut self, phase: Phase, max: f64) -> f64;
}

/// Hands each tracked document its own [`DeltaSource`].
///
/// `stream` is the document's acceptance index. A document's increments
/// depend only on that index, never on how many other documents draw
/// from their own streams in the meantime.
pub trait DeltaStreams: Send {
    fn stream(&mut self, stream: u64) -> Box<dyn DeltaSource>;
}

/// Uniformly random increments from a seedable generator.
pub struct RandomDelta {
    rng: StdRng,
}

impl RandomDelta {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl DeltaSource for RandomDelta {
    fn next_delta(&mut self, _phase: Phase, max: f64) -> f64 {
        // gen::<f64>() is in [0, 1), so this lands in (0, max]
        max * (1.0 - self.rng.gen::<f64>())
    }
}

/// Derives one [`RandomDelta`] per document from a base seed.
#[derive(Debug, Clone, Copy)]
pub struct RandomStreams {
    base_seed: u64,
}

impl RandomStreams {
    pub fn from_entropy() -> Self {
        Self::seeded(rand::random())
    }

    pub fn seeded(base_seed: u64) -> Self {
        Self { base_seed }
    }
}

impl DeltaStreams for RandomStreams {
    fn stream(&mut self, stream: u64) -> Box<dyn DeltaSource> {
        // Golden-ratio stride keeps neighbouring indices far apart
        let seed = self
            .base_seed
            .wrapping_add(stream.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        Box::new(RandomDelta::seeded(seed))
    }
}

/// The same increment every tick, clamped into `(0, max]`.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelta(f64);

impl FixedDelta {
    pub fn new(delta: f64) -> Self {
        Self(delta)
    }
}

impl DeltaSource for FixedDelta {
    fn next_delta(&mut self, _phase: Phase, max: f64) -> f64 {
        clamp_delta(self.0, max)
    }
}

impl DeltaStreams for FixedDelta {
    fn stream(&mut self, _stream: u64) -> Box<dyn DeltaSource> {
        Box::new(*self)
    }
}

/// Replays a fixed sequence of increments, then repeats `fallback`.
#[derive(Debug, Clone)]
pub struct ScriptedDelta {
    steps: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedDelta {
    pub fn new(steps: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            fallback,
        }
    }
}

impl DeltaSource for ScriptedDelta {
    fn next_delta(&mut self, _phase: Phase, max: f64) -> f64 {
        let delta = self.steps.pop_front().unwrap_or(self.fallback);
        clamp_delta(delta, max)
    }
}

/// Every document replays the script from the start.
impl DeltaStreams for ScriptedDelta {
    fn stream(&mut self, _stream: u64) -> Box<dyn DeltaSource> {
        Box::new(self.clone())
    }
}

fn clamp_delta(delta: f64, max: f64) -> f64 {
    if delta.is_nan() || delta <= 0.0 {
        f64::MIN_POSITIVE.min(max)
    } else {
        delta.min(max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_delta_in_range() {
        let mut source = RandomDelta::seeded(7);
        for _ in 0..10_000 {
            let upload = source.next_delta(Phase::Upload, 30.0);
            assert!(upload > 0.0 && upload <= 30.0);
            let processing = source.next_delta(Phase::Processing, 25.0);
            assert!(processing > 0.0 && processing <= 25.0);
        }
    }

    #[test]
    fn test_seeded_sources_repeat() {
        let mut a = RandomDelta::seeded(42);
        let mut b = RandomDelta::seeded(42);
        for _ in 0..16 {
            assert_eq!(
                a.next_delta(Phase::Upload, 30.0),
                b.next_delta(Phase::Upload, 30.0)
            );
        }
    }

    #[test]
    fn test_random_streams_are_per_document() {
        let mut streams = RandomStreams::seeded(7);
        let mut first = streams.stream(0);
        let first_draws: Vec<_> = (0..8)
            .map(|_| first.next_delta(Phase::Upload, 30.0))
            .collect();

        // Drawing heavily from another stream does not shift stream 0
        let mut other = streams.stream(1);
        for _ in 0..100 {
            other.next_delta(Phase::Upload, 30.0);
        }
        let mut again = RandomStreams::seeded(7).stream(0);
        let again_draws: Vec<_> = (0..8)
            .map(|_| again.next_delta(Phase::Upload, 30.0))
            .collect();
        assert_eq!(first_draws, again_draws);

        let mut second = RandomStreams::seeded(7).stream(1);
        assert_ne!(second.next_delta(Phase::Upload, 30.0), first_draws[0]);
    }

    #[test]
    fn test_scripted_streams_restart_per_document() {
        let mut streams = ScriptedDelta::new([5.0], 1.0);
        let mut a = streams.stream(0);
        assert_eq!(a.next_delta(Phase::Upload, 30.0), 5.0);
        let mut b = streams.stream(1);
        assert_eq!(b.next_delta(Phase::Upload, 30.0), 5.0);
        assert_eq!(a.next_delta(Phase::Upload, 30.0), 1.0);
    }

    #[test]
    fn test_fixed_delta_clamped() {
        assert_eq!(FixedDelta::new(40.0).next_delta(Phase::Upload, 30.0), 30.0);
        assert_eq!(FixedDelta::new(10.0).next_delta(Phase::Processing, 25.0), 10.0);
        assert!(FixedDelta::new(0.0).next_delta(Phase::Upload, 30.0) > 0.0);
    }

    #[test]
    fn test_scripted_delta_then_fallback() {
        let mut source = ScriptedDelta::new([5.0, 50.0], 1.0);
        assert_eq!(source.next_delta(Phase::Upload, 30.0), 5.0);
        assert_eq!(source.next_delta(Phase::Upload, 30.0), 30.0);
        assert_eq!(source.next_delta(Phase::Processing, 25.0), 1.0);
    }
}
