use rand::Rng;
use std::time::Duration;

/// Exponential backoff schedule with full jitter.
///
/// Used by stream reconnect loops (base 3s) and transient-error retries inside an
/// orchestrator tick (bounded by `max_attempts`).
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    /// Construct a new [`Backoff`] with the provided base delay, capped at `max`.
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            attempt: 0,
        }
    }

    /// Schedule for reconnecting market data streams: base 3s, capped at 60s.
    pub fn stream_reconnect() -> Self {
        Self::new(Duration::from_secs(3), Duration::from_secs(60))
    }

    /// Current attempt count.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Produce the next delay in the schedule, advancing the attempt counter.
    ///
    /// Full jitter: a uniform draw from `[0, base * 2^attempt]`, capped at `max`.
    pub fn next_delay(&mut self) -> Duration {
        let exp = self
            .base
            .saturating_mul(2u32.saturating_pow(self.attempt))
            .min(self.max);
        self.attempt = self.attempt.saturating_add(1);
        let ceiling_ms = exp.as_millis().max(1) as u64;
        Duration::from_millis(rand::thread_rng().gen_range(0..=ceiling_ms))
    }

    /// Reset the schedule after a successful operation.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_bounded_and_resets() {
        let mut backoff = Backoff::new(Duration::from_millis(100), Duration::from_millis(400));

        for _ in 0..10 {
            assert!(backoff.next_delay() <= Duration::from_millis(400));
        }
        assert_eq!(backoff.attempt(), 10);

        backoff.reset();
        assert_eq!(backoff.attempt(), 0);
        assert!(backoff.next_delay() <= Duration::from_millis(100));
    }
}
