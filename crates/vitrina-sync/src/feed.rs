//! # Change Feed
//!
//! In-process broadcast of product writes.
//!
//! ```text
//!   SqliteBackend ──publish──► ChangeFeed (broadcast) ──► Subscription ──► DraftStore
//!                                                    └──► Subscription ──► ...
//! ```
//!
//! Every subscriber sees every event published after it subscribed. A slow
//! subscriber that falls behind skips the overwritten events and logs how
//! many were lost.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;
use vitrina_core::{Product, ProductId};

/// Default number of events buffered per subscriber.
pub const DEFAULT_FEED_CAPACITY: usize = 256;

// =============================================================================
// Events
// =============================================================================

/// What happened to a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "record", rename_all = "snake_case")]
pub enum ChangeKind {
    Insert(Product),
    Update(Product),
    Delete(ProductId),
}

/// One change-feed message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub event_id: Uuid,
    #[serde(flatten)]
    pub kind: ChangeKind,
    pub at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind) -> Self {
        ChangeEvent {
            event_id: Uuid::new_v4(),
            kind,
            at: Utc::now(),
        }
    }

    /// Id of the affected product.
    pub fn product_id(&self) -> ProductId {
        match &self.kind {
            ChangeKind::Insert(product) | ChangeKind::Update(product) => product.id,
            ChangeKind::Delete(id) => *id,
        }
    }
}

// =============================================================================
// Feed
// =============================================================================

/// Publisher side of the change feed. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        ChangeFeed { tx }
    }

    /// Publishes an event. Having no subscribers is not an error.
    pub fn publish(&self, event: ChangeEvent) {
        let id = event.product_id();
        match self.tx.send(event) {
            Ok(receivers) => debug!(product_id = id, receivers, "Change event published"),
            Err(_) => debug!(product_id = id, "Change event dropped, no subscribers"),
        }
    }

    /// Subscribes to events published from now on.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: Some(self.tx.subscribe()),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// Receiver side of the change feed.
///
/// Dropping it or calling [`Subscription::dispose`] unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    rx: Option<broadcast::Receiver<ChangeEvent>>,
}

impl Subscription {
    /// Waits for the next event.
    ///
    /// Returns `None` once the feed is closed or the subscription disposed.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        let rx = self.rx.as_mut()?;
        loop {
            match rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Change feed subscriber lagged, events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.rx = None;
                    return None;
                }
            }
        }
    }

    /// Unsubscribes. Later `recv` calls return `None`.
    pub fn dispose(&mut self) {
        self.rx = None;
    }

    pub fn is_active(&self) -> bool {
        self.rx.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let feed = ChangeFeed::default();
        let mut first = feed.subscribe();
        let mut second = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 2);

        feed.publish(ChangeEvent::new(ChangeKind::Delete(7)));

        assert_eq!(first.recv().await.unwrap().product_id(), 7);
        assert_eq!(second.recv().await.unwrap().product_id(), 7);
    }

    #[tokio::test]
    async fn test_dispose_unsubscribes() {
        let feed = ChangeFeed::default();
        let mut sub = feed.subscribe();

        sub.dispose();
        assert!(!sub.is_active());
        assert_eq!(feed.subscriber_count(), 0);
        assert!(sub.recv().await.is_none());

        // Publishing with nobody listening is fine
        feed.publish(ChangeEvent::new(ChangeKind::Delete(1)));
    }

    #[tokio::test]
    async fn test_closed_feed_ends_subscription() {
        let feed = ChangeFeed::default();
        let mut sub = feed.subscribe();
        drop(feed);
        assert!(sub.recv().await.is_none());
        assert!(!sub.is_active());
    }

    #[tokio::test]
    async fn test_lagged_subscriber_skips_ahead() {
        let feed = ChangeFeed::new(2);
        let mut sub = feed.subscribe();

        for id in 1..=4 {
            feed.publish(ChangeEvent::new(ChangeKind::Delete(id)));
        }

        assert_eq!(sub.recv().await.unwrap().product_id(), 3);
        assert_eq!(sub.recv().await.unwrap().product_id(), 4);
    }

    #[test]
    fn test_event_wire_shape() {
        let event = ChangeEvent::new(ChangeKind::Delete(42));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "delete");
        assert_eq!(json["record"], 42);

        let back: ChangeEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
