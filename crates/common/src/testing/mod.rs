//! Testing utilities and helpers
//!
//! - **[`async_utils`]**: waiting on background tasks with a deadline
//! - **[`temp`]**: temporary directories that clean up on drop
//!
//! The deterministic clock lives in [`crate::time::MockClock`].

pub mod async_utils;
pub mod temp;

pub use async_utils::{poll_until, timeout_ok};
pub use temp::TempDir;
