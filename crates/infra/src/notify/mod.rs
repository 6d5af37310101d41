//! Notification sinks

pub mod channel;
pub mod fanout;
pub mod tracing_sink;

pub use channel::ChannelNotificationSink;
pub use fanout::FanoutNotificationSink;
pub use tracing_sink::TracingNotificationSink;
