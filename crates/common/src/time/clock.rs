//! Wall-clock and monotonic time sources.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use ferry_common::time::{Clock, MockClock, SystemClock};
//!
//! // Use system clock in production
//! let clock = SystemClock;
//! let _now = clock.utc_now();
//!
//! // Use mock clock in tests
//! let mock = MockClock::new();
//! let start = mock.millis_since_epoch();
//! mock.advance(Duration::from_millis(250));
//! assert_eq!(mock.millis_since_epoch() - start, 250);
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

/// Trait for time operations to enable testing
pub trait Clock: Send + Sync {
    /// Get current instant (monotonic time)
    fn now(&self) -> Instant;

    /// Get current system time (wall clock)
    fn system_time(&self) -> SystemTime;

    /// Get milliseconds since UNIX epoch
    ///
    /// A wall clock set before the epoch reads as zero.
    fn millis_since_epoch(&self) -> i64 {
        let millis = self.system_time().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        i64::try_from(millis).unwrap_or(i64::MAX)
    }

    /// Current wall-clock time truncated to millisecond precision.
    fn utc_now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.millis_since_epoch()).single().unwrap_or_default()
    }
}

/// Real system clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

#[derive(Debug)]
struct MockState {
    elapsed: Duration,
    system_time: SystemTime,
}

/// Mock clock for deterministic testing
///
/// Monotonic time only moves forward through [`MockClock::advance`]. The
/// wall clock can additionally be pinned anywhere with
/// [`MockClock::set_system_time`], including backwards, to exercise clock
/// skew.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    state: Arc<Mutex<MockState>>,
}

impl MockClock {
    /// Create a new mock clock starting at the current real time.
    pub fn new() -> Self {
        Self::at(SystemTime::now())
    }

    /// Create a mock clock whose wall clock starts at `system_time`.
    pub fn at(system_time: SystemTime) -> Self {
        Self {
            start: Instant::now(),
            state: Arc::new(Mutex::new(MockState { elapsed: Duration::ZERO, system_time })),
        }
    }

    /// Create a mock clock starting at the given epoch milliseconds.
    pub fn at_millis(millis: u64) -> Self {
        Self::at(UNIX_EPOCH + Duration::from_millis(millis))
    }

    /// Advance both monotonic and wall-clock time by `duration`.
    pub fn advance(&self, duration: Duration) {
        let mut state = self.state.lock();
        state.elapsed += duration;
        state.system_time += duration;
    }

    /// Pin the wall clock to `system_time` without touching monotonic time.
    pub fn set_system_time(&self, system_time: SystemTime) {
        self.state.lock().system_time = system_time;
    }

    /// How much monotonic time has been simulated since creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.state.lock().elapsed
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.state.lock().elapsed
    }

    fn system_time(&self) -> SystemTime {
        self.state.lock().system_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validates the system clock scenario.
    ///
    /// Assertions:
    /// - Ensures `now2 >= now1` evaluates to true.
    #[test]
    fn test_system_clock() {
        let clock = SystemClock;
        let now1 = clock.now();
        let now2 = clock.now();

        assert!(now2 >= now1);
        assert!(clock.millis_since_epoch() > 0);
    }

    #[test]
    fn test_mock_clock_advance_moves_both_clocks() {
        let clock = MockClock::at_millis(1_700_000_000_000);
        let start = clock.now();

        clock.advance(Duration::from_secs(5));

        assert_eq!(clock.now().duration_since(start), Duration::from_secs(5));
        assert_eq!(clock.millis_since_epoch(), 1_700_000_005_000);
        assert_eq!(clock.elapsed(), Duration::from_secs(5));
    }

    #[test]
    fn test_mock_clock_wall_time_can_move_backwards() {
        let clock = MockClock::at_millis(2_000);
        clock.set_system_time(UNIX_EPOCH + Duration::from_millis(1_000));

        assert_eq!(clock.millis_since_epoch(), 1_000);
        assert_eq!(clock.utc_now().timestamp_millis(), 1_000);
    }

    #[test]
    fn test_utc_now_truncates_to_millis() {
        let clock = MockClock::at(UNIX_EPOCH + Duration::from_nanos(1_234_567_891));
        assert_eq!(clock.utc_now().timestamp_subsec_nanos(), 234_000_000);
    }
}
