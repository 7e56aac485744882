use std::time::Duration;

use rand::Rng;

/// Source of the artificial delay injected ahead of each replication call.
///
/// This emulates network jitter for demos and load tests. It sits behind a
/// trait so the coordinator and replica client can be exercised with a
/// deterministic implementation.
pub trait Latency: Send + Sync + 'static {
    /// The delay to sleep before the next replication attempt.
    fn delay(&self) -> Duration;
}

/// Draws a delay uniformly from `[min, max]` on every call.
#[derive(Debug, Clone)]
pub struct UniformLatency {
    min: Duration,
    max: Duration,
}

impl UniformLatency {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }
}

impl Latency for UniformLatency {
    fn delay(&self) -> Duration {
        // A degenerate range collapses to its lower bound.
        if self.min >= self.max {
            return self.min;
        }
        let micros = rand::thread_rng().gen_range(self.min.as_micros()..=self.max.as_micros());
        Duration::from_micros(micros as u64)
    }
}

/// No injected delay at all, for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroLatency;

impl Latency for ZeroLatency {
    fn delay(&self) -> Duration {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_stays_within_bounds() {
        let latency = UniformLatency::new(Duration::from_micros(100), Duration::from_millis(10));
        for _ in 0..100 {
            let d = latency.delay();
            assert!(d >= Duration::from_micros(100));
            assert!(d <= Duration::from_millis(10));
        }
    }

    #[test]
    fn degenerate_range_returns_lower_bound() {
        let latency = UniformLatency::new(Duration::from_millis(5), Duration::from_millis(5));
        assert_eq!(latency.delay(), Duration::from_millis(5));

        let inverted = UniformLatency::new(Duration::from_millis(5), Duration::from_millis(1));
        assert_eq!(inverted.delay(), Duration::from_millis(5));
    }

    #[test]
    fn zero_latency_is_zero() {
        assert_eq!(ZeroLatency.delay(), Duration::ZERO);
    }
}
