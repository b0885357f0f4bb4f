//! Watch bus for object change notifications.

use std::fmt;

use hydroculture_core::NamespacedName;
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::{Error, Result};

/// Default number of buffered events per subscriber.
pub const DEFAULT_WATCH_CAPACITY: usize = 1024;

/// Kind of change an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchEventType {
    Added,
    Modified,
    Deleted,
}

impl fmt::Display for WatchEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Modified => write!(f, "modified"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

/// A change to a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub event_type: WatchEventType,
    pub key: NamespacedName,
    /// Generation of the object after the change.
    pub generation: i64,
}

impl WatchEvent {
    /// Create a new watch event.
    pub const fn new(event_type: WatchEventType, key: NamespacedName, generation: i64) -> Self {
        Self {
            event_type,
            key,
            generation,
        }
    }
}

/// Subscription handle for receiving watch events.
pub struct WatchSubscription {
    receiver: broadcast::Receiver<WatchEvent>,
}

impl WatchSubscription {
    /// Receive the next event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WatchLagged`] when events were dropped because this
    /// subscriber fell behind; the caller should relist. Returns
    /// [`Error::WatchClosed`] once the bus is gone.
    pub async fn recv(&mut self) -> Result<WatchEvent> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Lagged(missed) => Error::WatchLagged { missed },
            broadcast::error::RecvError::Closed => Error::WatchClosed,
        })
    }

    /// Take the next buffered event without waiting.
    ///
    /// Returns `Ok(None)` when nothing is buffered.
    ///
    /// # Errors
    ///
    /// Same as [`WatchSubscription::recv`].
    pub fn try_recv(&mut self) -> Result<Option<WatchEvent>> {
        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                Err(Error::WatchLagged { missed })
            }
            Err(broadcast::error::TryRecvError::Closed) => Err(Error::WatchClosed),
        }
    }
}

/// Broadcast bus for watch events.
pub struct WatchBus {
    sender: broadcast::Sender<WatchEvent>,
}

impl WatchBus {
    /// Create a new bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to every subscriber.
    ///
    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, event: WatchEvent) {
        debug!(
            event_type = %event.event_type,
            key = %event.key,
            generation = event.generation,
            "Publishing watch event"
        );
        let _ = self.sender.send(event);
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> WatchSubscription {
        WatchSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for WatchBus {
    fn default() -> Self {
        Self::new(DEFAULT_WATCH_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str) -> WatchEvent {
        WatchEvent::new(
            WatchEventType::Added,
            NamespacedName::new("default", name),
            1,
        )
    }

    #[tokio::test]
    async fn test_subscriber_receives_published_event() {
        let bus = WatchBus::default();
        let mut sub = bus.subscribe();

        bus.publish(event("basil-tray"));

        let received = sub.recv().await.ok();
        assert_eq!(received, Some(event("basil-tray")));
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let bus = WatchBus::default();
        bus.publish(event("basil-tray"));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_slow_subscriber_reports_lag() {
        let bus = WatchBus::new(1);
        let mut sub = bus.subscribe();

        bus.publish(event("a"));
        bus.publish(event("b"));

        let first = sub.recv().await;
        assert!(matches!(first, Err(Error::WatchLagged { missed: 1 })));
        assert_eq!(sub.recv().await.ok(), Some(event("b")));
    }

    #[test]
    fn test_try_recv_empty_buffer_is_not_closed() {
        let bus = WatchBus::default();
        let mut sub = bus.subscribe();

        assert!(matches!(sub.try_recv(), Ok(None)));

        bus.publish(event("a"));
        assert_eq!(sub.try_recv().ok().flatten(), Some(event("a")));
        assert!(matches!(sub.try_recv(), Ok(None)));
    }

    #[test]
    fn test_try_recv_reports_lag_and_close() {
        let bus = WatchBus::new(1);
        let mut sub = bus.subscribe();

        bus.publish(event("a"));
        bus.publish(event("b"));
        assert!(matches!(sub.try_recv(), Err(Error::WatchLagged { missed: 1 })));
        assert_eq!(sub.try_recv().ok().flatten(), Some(event("b")));

        drop(bus);
        assert!(matches!(sub.try_recv(), Err(Error::WatchClosed)));
    }
}
