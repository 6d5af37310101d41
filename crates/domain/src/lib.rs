//! # Ferry Domain
//!
//! Domain types for the offline operation queue.
//!
//! This crate contains:
//! - Queued operations and their typed payloads
//! - Connectivity, notification and sync report types
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other Ferry crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
