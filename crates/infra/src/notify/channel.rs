//! Forwards notifications to a UI consumer over an unbounded channel

use ferry_core::NotificationSink;
use ferry_domain::Notification;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ChannelNotificationSink {
    sender: UnboundedSender<Notification>,
}

impl ChannelNotificationSink {
    /// Create a sink and the receiver its notifications arrive on.
    pub fn new() -> (Self, UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl NotificationSink for ChannelNotificationSink {
    fn notify(&self, notification: Notification) {
        if self.sender.send(notification).is_err() {
            debug!("Notification receiver dropped; discarding");
        }
    }
}

#[cfg(test)]
mod tests {
    use ferry_domain::NotificationKind;

    use super::*;

    #[test]
    fn test_delivers_in_order_and_survives_closed_receiver() {
        let (sink, mut receiver) = ChannelNotificationSink::new();
        sink.notify(Notification::info(NotificationKind::Queued, "one"));
        sink.notify(Notification::warning(NotificationKind::Offline, "two"));

        assert_eq!(receiver.try_recv().unwrap().message, "one");
        assert_eq!(receiver.try_recv().unwrap().message, "two");

        drop(receiver);
        assert!(sink.is_closed());
        sink.notify(Notification::info(NotificationKind::Queued, "dropped"));
    }
}
