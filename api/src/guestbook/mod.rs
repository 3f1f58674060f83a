use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use self::comment::CommentRecord;

pub mod comment;
pub mod models;
pub mod routes;

const EVENTS_CAPACITY: usize = 256;

/// Notifications pushed to every client connected to the guest book stream.
/// Clients re-fetch and rebuild their tree on message events.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum GuestBookEvent {
    NewMessage(CommentRecord),
    MessageUpdated(CommentRecord),
    MessageDeleted { id: String },
    OnlineCount { count: usize },
}

/// Process wide guest book state. Counters live as long as the server and
/// start from zero on restart.
pub struct GuestBook {
    events: broadcast::Sender<GuestBookEvent>,
    online: AtomicUsize,
}

impl GuestBook {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENTS_CAPACITY);
        Self {
            events,
            online: AtomicUsize::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GuestBookEvent> {
        self.events.subscribe()
    }

    pub fn publish(&self, event: GuestBookEvent) {
        // An error only means nobody is listening right now
        if let Ok(receivers) = self.events.send(event) {
            tracing::debug!(receivers, "Emitted guest book event");
        }
    }

    pub fn online_count(&self) -> usize {
        self.online.load(Ordering::Relaxed)
    }

    /// Counts the caller as present until the returned guard is dropped.
    pub fn join(self: &Arc<Self>) -> Presence {
        let count = self.online.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(count, "User joined guest book");
        self.publish(GuestBookEvent::OnlineCount { count });

        Presence {
            guest_book: self.clone(),
        }
    }
}

impl Default for GuestBook {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Presence {
    guest_book: Arc<GuestBook>,
}

impl Drop for Presence {
    fn drop(&mut self) {
        let count = self.guest_book.online.fetch_sub(1, Ordering::Relaxed) - 1;
        tracing::debug!(count, "User left guest book");
        self.guest_book
            .publish(GuestBookEvent::OnlineCount { count });
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_presence_counts_until_dropped() {
        let guest_book = Arc::new(GuestBook::new());

        let first = guest_book.join();
        let second = guest_book.join();
        assert_eq!(guest_book.online_count(), 2);

        drop(first);
        assert_eq!(guest_book.online_count(), 1);

        drop(second);
        assert_eq!(guest_book.online_count(), 0);
    }

    #[test]
    fn test_presence_changes_are_published() {
        let guest_book = Arc::new(GuestBook::new());
        let mut events = guest_book.subscribe();

        let presence = guest_book.join();
        drop(presence);

        assert_eq!(
            events.try_recv().unwrap(),
            GuestBookEvent::OnlineCount { count: 1 }
        );
        assert_eq!(
            events.try_recv().unwrap(),
            GuestBookEvent::OnlineCount { count: 0 }
        );
    }

    #[test]
    fn test_publish_without_listeners_is_fine() {
        let guest_book = GuestBook::new();
        guest_book.publish(GuestBookEvent::MessageDeleted { id: "1".into() });
    }

    #[test]
    fn test_event_wire_shape() {
        let json =
            serde_json::to_value(GuestBookEvent::MessageDeleted { id: "abc".into() }).unwrap();

        assert_eq!(json["type"], "MessageDeleted");
        assert_eq!(json["data"]["id"], "abc");
    }
}
