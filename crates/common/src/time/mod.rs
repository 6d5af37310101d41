//! Time abstraction for testability
//!
//! Queue timestamps and backoff scheduling read the clock through the
//! [`Clock`] trait so tests can pin or move time deterministically.

pub mod clock;

pub use clock::{Clock, MockClock, SystemClock};
