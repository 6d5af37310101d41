//! Retry timing
//!
//! Exponential backoff with a hard cap and optional symmetric jitter. The
//! reconciliation worker asks [`Backoff::delay_for`] how long to wait after
//! the Nth consecutive transient failure.

pub mod backoff;
pub mod constants;

pub use backoff::{Backoff, BackoffBuilder, BackoffError};
