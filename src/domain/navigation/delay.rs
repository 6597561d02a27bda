//! Human-like pause before each reply.

use rand::Rng;
use std::time::Duration;

use crate::domain::foundation::ValidationError;

/// Uniform random delay between `min_ms` and `max_ms` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyDelay {
    min_ms: u64,
    max_ms: u64,
}

impl ReplyDelay {
    pub const DEFAULT_MIN_MS: u64 = 2_000;
    pub const DEFAULT_MAX_MS: u64 = 5_000;

    pub fn new(min_ms: u64, max_ms: u64) -> Result<Self, ValidationError> {
        if min_ms > max_ms {
            return Err(ValidationError::invalid_format(
                "reply_delay",
                format!("min {}ms exceeds max {}ms", min_ms, max_ms),
            ));
        }
        Ok(Self { min_ms, max_ms })
    }

    /// No delay at all. Used by tests and the mock wiring.
    pub fn none() -> Self {
        Self { min_ms: 0, max_ms: 0 }
    }

    pub fn min_ms(&self) -> u64 {
        self.min_ms
    }

    pub fn max_ms(&self) -> u64 {
        self.max_ms
    }

    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min_ms == self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rng.gen_range(self.min_ms..=self.max_ms))
    }

    pub fn sample(&self) -> Duration {
        self.sample_with(&mut rand::thread_rng())
    }
}

impl Default for ReplyDelay {
    fn default() -> Self {
        Self {
            min_ms: Self::DEFAULT_MIN_MS,
            max_ms: Self::DEFAULT_MAX_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_range_is_two_to_five_seconds() {
        let delay = ReplyDelay::default();
        for _ in 0..100 {
            let d = delay.sample();
            assert!(d >= Duration::from_secs(2) && d <= Duration::from_secs(5));
        }
    }

    #[test]
    fn none_is_zero() {
        assert_eq!(ReplyDelay::none().sample(), Duration::ZERO);
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(ReplyDelay::new(5_000, 2_000).is_err());
    }
}
