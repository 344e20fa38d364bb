//! Publish/subscribe collaborator for change notifications.
//!
//! Services publish on `match:<id>` topics after anything that changes what a match page shows.
//! Delivery (WebSocket, SSE, ...) is left to whoever subscribes.

use serde::Serialize;
use tokio::sync::broadcast;

pub trait Publisher: Send + Sync {
    fn publish(&self, topic: &str, message: serde_json::Value);
}

pub fn match_topic(match_id: impl std::fmt::Display) -> String {
    format!("match:{match_id}")
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPublisher;

impl Publisher for NoopPublisher {
    fn publish(&self, _topic: &str, _message: serde_json::Value) {}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub topic: String,
    pub message: serde_json::Value,
}

/// In-process fan-out on a tokio broadcast channel. Slow subscribers lose the oldest messages.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Publisher for BroadcastPublisher {
    fn publish(&self, topic: &str, message: serde_json::Value) {
        let notification = Notification {
            topic: topic.to_string(),
            message,
        };
        // No subscribers is not an error.
        if self.sender.send(notification).is_err() {
            tracing::trace!(target: "calciotto::notify", %topic, "no subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_receive_published_messages() {
        let publisher = BroadcastPublisher::new(8);
        let mut rx = publisher.subscribe();
        publisher.publish("match:1", serde_json::json!({ "event": "variant_applied" }));

        let received = rx.try_recv().expect("message should be queued");
        assert_eq!(received.topic, "match:1");
        assert_eq!(received.message["event"], "variant_applied");
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let publisher = BroadcastPublisher::default();
        publisher.publish("match:2", serde_json::Value::Null);
        NoopPublisher.publish("match:2", serde_json::Value::Null);
    }
}
