use std::time::Duration;

use rand::Rng;

/// Artificial delay awaited at the start of every record operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Latency {
    min: Duration,
    max: Duration,
}

impl Latency {
    /// No delay at all.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Uniformly distributed delay between `min` and `max` (inclusive).
    pub fn between(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self::between(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }

    pub fn is_disabled(&self) -> bool {
        self.max.is_zero()
    }

    fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let min_ms = self.min.as_millis() as u64;
        let max_ms = self.max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
    }

    pub async fn pause(&self) {
        if self.is_disabled() {
            return;
        }
        let delay = self.sample();
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn between_orders_bounds() {
        let latency = Latency::from_millis(800, 200);
        assert_eq!(latency, Latency::from_millis(200, 800));
    }

    #[test]
    fn samples_stay_within_bounds() {
        let latency = Latency::from_millis(200, 800);
        for _ in 0..100 {
            let delay = latency.sample();
            assert!(delay >= Duration::from_millis(200));
            assert!(delay <= Duration::from_millis(800));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn pause_waits_for_fixed_delay() {
        let latency = Latency::from_millis(250, 250);
        let started = tokio::time::Instant::now();
        latency.pause().await;
        assert!(started.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test]
    async fn disabled_latency_returns_immediately() {
        assert!(Latency::disabled().is_disabled());
        Latency::disabled().pause().await;
    }
}
