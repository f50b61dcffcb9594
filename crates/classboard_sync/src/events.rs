//! Sync event broadcasting.
//!
//! A lightweight publish/subscribe channel: each accepted write
//! broadcasts only `{timestamp, source}` to connected subscribers. No
//! payload travels through the channel; it is a "wake up and re-sync"
//! signal, so the cost per event is independent of document size.
//! Subscribers that miss a beat simply re-fetch on their next poll.

use classboard_model::Timestamp;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};

/// A sync beat: something changed, re-fetch when convenient.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncEvent {
    /// The document clock after the change.
    pub updated_at: Timestamp,
    /// Who caused it (node id or actor name).
    pub source: String,
}

/// A live subscription to sync events.
pub struct EventSubscription {
    /// Identifier for [`EventBus::unsubscribe`].
    pub id: u64,
    /// The event channel.
    pub receiver: Receiver<SyncEvent>,
}

/// Injectable pub/sub seam.
///
/// The in-memory implementation is per process; a broker-backed one can
/// replace it without touching the engine.
pub trait EventBus: Send + Sync {
    /// Registers a subscriber. The current baseline event (if any) is
    /// delivered immediately so a connecting client never misses the
    /// starting point.
    fn subscribe(&self) -> EventSubscription;

    /// Removes a subscriber.
    fn unsubscribe(&self, id: u64);

    /// Fans an event out to all subscribers.
    fn publish(&self, event: SyncEvent);
}

/// In-memory, process-local event bus.
///
/// Subscriber channels are unbounded; dead subscribers are pruned on the
/// next publish.
pub struct SyncBroadcaster {
    subscribers: RwLock<HashMap<u64, Sender<SyncEvent>>>,
    last: RwLock<Option<SyncEvent>>,
    next_id: AtomicU64,
}

impl SyncBroadcaster {
    /// Creates an empty broadcaster.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            last: RwLock::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Seeds the baseline event without fanning it out. Used at startup
    /// so the first subscriber immediately learns the current clock.
    pub fn seed(&self, event: SyncEvent) {
        let mut last = self.last.write();
        if last.is_none() {
            *last = Some(event);
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// The most recent event, if any.
    pub fn last_event(&self) -> Option<SyncEvent> {
        self.last.read().clone()
    }
}

impl Default for SyncBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for SyncBroadcaster {
    fn subscribe(&self) -> EventSubscription {
        let (tx, rx) = mpsc::channel();
        if let Some(event) = self.last.read().clone() {
            // Baseline beat; a send to our own fresh channel cannot fail.
            let _ = tx.send(event);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscribers.write().insert(id, tx);
        EventSubscription { id, receiver: rx }
    }

    fn unsubscribe(&self, id: u64) {
        self.subscribers.write().remove(&id);
    }

    fn publish(&self, event: SyncEvent) {
        *self.last.write() = Some(event.clone());
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|_, tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn event(stamp: &str, source: &str) -> SyncEvent {
        SyncEvent {
            updated_at: Timestamp::parse(stamp).unwrap(),
            source: source.into(),
        }
    }

    #[test]
    fn publish_reaches_all_subscribers() {
        let bus = SyncBroadcaster::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        bus.publish(event("2026-02-03T10:00:00+05:30", "node-1"));

        let got_a = a.receiver.recv_timeout(Duration::from_millis(100)).unwrap();
        let got_b = b.receiver.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(got_a.source, "node-1");
        assert_eq!(got_a, got_b);
    }

    #[test]
    fn new_subscriber_gets_baseline_immediately() {
        let bus = SyncBroadcaster::new();
        bus.publish(event("2026-02-03T10:00:00+05:30", "node-1"));

        let sub = bus.subscribe();
        let baseline = sub
            .receiver
            .recv_timeout(Duration::from_millis(100))
            .unwrap();
        assert_eq!(baseline.source, "node-1");
    }

    #[test]
    fn seed_does_not_overwrite_live_events() {
        let bus = SyncBroadcaster::new();
        bus.publish(event("2026-02-03T10:00:00+05:30", "live"));
        bus.seed(event("2026-01-01T00:00:00+05:30", "stale-seed"));
        assert_eq!(bus.last_event().unwrap().source, "live");
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let bus = SyncBroadcaster::new();
        let sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(sub);
        bus.publish(event("2026-02-03T10:00:00+05:30", "node-1"));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn unsubscribe_removes_channel() {
        let bus = SyncBroadcaster::new();
        let sub = bus.subscribe();
        bus.unsubscribe(sub.id);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
