//! Connectivity tracking

pub mod monitor;
pub mod ports;

pub use monitor::{ConnectivityMonitor, Subscription};
pub use ports::{ConnectivitySource, SignalCallback, SourceSubscription};
