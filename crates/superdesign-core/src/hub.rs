//! Fan-out of sync messages to connected viewers

use crate::types::SyncMessage;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

pub type SubscriberId = Uuid;

/// Receiving half handed to a viewer connection. Each item is one JSON body
/// shaped `{event, data}`.
pub type SubscriberReceiver = mpsc::UnboundedReceiver<String>;

/// Subscriber set of one watch session
#[derive(Debug, Default)]
pub struct NotificationHub {
    subscribers: HashMap<SubscriberId, mpsc::UnboundedSender<String>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber and return its id with the receiving end
    pub fn subscribe(&mut self) -> (SubscriberId, SubscriberReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.subscribers.insert(id, tx);
        debug!("Subscriber {} added ({} total)", id, self.subscribers.len());
        (id, rx)
    }

    pub fn unsubscribe(&mut self, id: &SubscriberId) -> bool {
        let removed = self.subscribers.remove(id).is_some();
        if removed {
            debug!("Subscriber {} removed ({} left)", id, self.subscribers.len());
        }
        removed
    }

    /// Deliver `message` to every subscriber. Subscribers whose channel is
    /// closed are dropped. Returns the number of successful deliveries.
    pub fn broadcast(&mut self, message: &SyncMessage) -> usize {
        if self.subscribers.is_empty() {
            return 0;
        }
        let body = message.to_json();
        let mut delivered = 0;
        self.subscribers.retain(|id, tx| match tx.send(body.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(_) => {
                debug!("Subscriber {} disconnected, removing", id);
                false
            }
        });
        delivered
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Drop every subscriber, closing their channels
    pub fn clear(&mut self) {
        self.subscribers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChangeType, FileChange};

    #[test]
    fn test_broadcast_reaches_every_subscriber() {
        let mut hub = NotificationHub::new();
        let (_a, mut rx_a) = hub.subscribe();
        let (_b, mut rx_b) = hub.subscribe();

        let msg = SyncMessage::file_changed(&FileChange::new("a.html", ChangeType::Added));
        assert_eq!(hub.broadcast(&msg), 2);

        let body = rx_a.try_recv().unwrap();
        assert_eq!(body, rx_b.try_recv().unwrap());
        let parsed: SyncMessage = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_closed_subscriber_is_dropped_without_affecting_others() {
        let mut hub = NotificationHub::new();
        let (_gone, rx_gone) = hub.subscribe();
        let (_live, mut rx_live) = hub.subscribe();
        drop(rx_gone);

        assert_eq!(hub.broadcast(&SyncMessage::connected()), 1);
        assert_eq!(hub.len(), 1);
        assert!(rx_live.try_recv().is_ok());
    }

    #[test]
    fn test_unsubscribe_and_clear() {
        let mut hub = NotificationHub::new();
        let (id, _rx) = hub.subscribe();
        assert!(hub.unsubscribe(&id));
        assert!(!hub.unsubscribe(&id));

        let (_id, mut rx) = hub.subscribe();
        hub.clear();
        assert!(hub.is_empty());
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_order_is_preserved_per_subscriber() {
        let mut hub = NotificationHub::new();
        let (_id, mut rx) = hub.subscribe();
        for name in ["1.html", "2.html", "3.html"] {
            hub.broadcast(&SyncMessage::file_changed(&FileChange::new(
                name,
                ChangeType::Added,
            )));
        }
        for name in ["1.html", "2.html", "3.html"] {
            let parsed: SyncMessage = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
            assert_eq!(parsed.data["file"], name);
        }
    }
}
