// Exponential backoff with jitter
use std::time::Duration;

use rand::Rng;
use thiserror::Error;

use super::constants::{
    DEFAULT_BASE_DELAY, DEFAULT_JITTER_FACTOR, DEFAULT_MAX_DELAY, MAX_BACKOFF_EXPONENT,
};

/// Invalid backoff configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackoffError {
    #[error("base_delay must be greater than zero")]
    ZeroBaseDelay,

    #[error("base_delay ({base:?}) cannot be greater than max_delay ({max:?})")]
    BaseExceedsMax { base: Duration, max: Duration },
}

/// Exponential backoff schedule: `base * 2^attempt`, capped at `max`.
///
/// Attempt numbering starts at zero, so the first retry waits `base`.
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    base_delay: Duration,
    max_delay: Duration,
    jitter_factor: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            jitter_factor: DEFAULT_JITTER_FACTOR,
        }
    }
}

impl Backoff {
    pub fn builder() -> BackoffBuilder {
        BackoffBuilder::default()
    }

    /// Create a validated schedule with the default jitter factor.
    pub fn new(base_delay: Duration, max_delay: Duration) -> Result<Self, BackoffError> {
        Self::builder().base_delay(base_delay).max_delay(max_delay).build()
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn jitter_factor(&self) -> f64 {
        self.jitter_factor
    }

    /// Delay before retry number `attempt`, jitter applied.
    ///
    /// The jittered value never exceeds `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = self.apply_jitter(self.exponential_delay(attempt));
        delay.min(self.max_delay)
    }

    /// Delay before retry number `attempt` without jitter.
    pub fn exponential_delay(&self, attempt: u32) -> Duration {
        let base_millis = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let max_millis = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);

        // Cap exponent to prevent overflow
        let exponent = attempt.min(MAX_BACKOFF_EXPONENT);
        let multiplier = 2_u64.saturating_pow(exponent);

        let delay_millis = base_millis.saturating_mul(multiplier).min(max_millis);
        Duration::from_millis(delay_millis)
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn apply_jitter(&self, delay: Duration) -> Duration {
        if self.jitter_factor == 0.0 || delay.is_zero() {
            return delay;
        }

        let mut rng = rand::thread_rng();
        let delay_millis = delay.as_millis() as f64;
        let jitter_range = delay_millis * self.jitter_factor;

        // Add random jitter: -jitter_range/2 to +jitter_range/2
        let jitter = rng.gen_range(-jitter_range / 2.0..=jitter_range / 2.0);
        let final_millis = (delay_millis + jitter).max(0.0) as u64;

        Duration::from_millis(final_millis)
    }
}

/// Builder for [`Backoff`].
#[derive(Debug, Clone)]
pub struct BackoffBuilder {
    base_delay: Duration,
    max_delay: Duration,
    jitter_factor: f64,
}

impl Default for BackoffBuilder {
    fn default() -> Self {
        let defaults = Backoff::default();
        Self {
            base_delay: defaults.base_delay,
            max_delay: defaults.max_delay,
            jitter_factor: defaults.jitter_factor,
        }
    }
}

impl BackoffBuilder {
    #[must_use]
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    #[must_use]
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the jitter factor (0.0 = no jitter, 1.0 = full jitter)
    #[must_use]
    pub fn jitter_factor(mut self, factor: f64) -> Self {
        self.jitter_factor = if factor.is_nan() { 0.0 } else { factor.clamp(0.0, 1.0) };
        self
    }

    pub fn build(self) -> Result<Backoff, BackoffError> {
        if self.base_delay.is_zero() {
            return Err(BackoffError::ZeroBaseDelay);
        }
        if self.base_delay > self.max_delay {
            return Err(BackoffError::BaseExceedsMax { base: self.base_delay, max: self.max_delay });
        }

        Ok(Backoff {
            base_delay: self.base_delay,
            max_delay: self.max_delay,
            jitter_factor: self.jitter_factor,
        })
    }
}
