//! Offline operation queue

pub mod manager;
pub mod ports;
pub mod store;

pub use manager::QueueManager;
pub use ports::KeyValueStore;
pub use store::DurableQueueStore;
