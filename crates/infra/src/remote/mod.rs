//! Remote backend adapters

pub mod errors;
pub mod http_applier;

pub use errors::{RemoteError, RemoteErrorCategory};
pub use http_applier::{HttpRemoteApplier, HttpRemoteApplierBuilder, IDEMPOTENCY_HEADER};
