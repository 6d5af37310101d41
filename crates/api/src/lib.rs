//! # Ferry App
//!
//! Application layer - wiring and main entry point.
//!
//! This crate contains:
//! - Application context (dependency injection)
//! - Logging initialisation and structured log helpers
//! - The `ferry` binary
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod context;
pub mod utils;

// Re-export for convenience
pub use context::*;
