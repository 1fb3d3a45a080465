//! In-process, topic-keyed publish/subscribe.
//!
//! ```text
//!  publish(topic, payload)
//!        │  snapshot of senders (registration order)
//!        ▼
//!  ┌─────────────┐   unbounded mpsc   ┌──────────────┐
//!  │  Registry   │ ─────────────────► │ Subscription │ ── Stream<Item = T>
//!  │ topic → [ ] │                    └──────────────┘
//!  └─────────────┘ ◄── Drop deregisters ───┘
//! ```
//!
//! Publishing never waits on a subscriber. Each subscriber has its own
//! unbounded queue, and delivery is best-effort and at-most-once to whoever
//! is registered when the snapshot is taken. Nothing is buffered for future
//! subscribers.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Name of a class of events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic(Cow<'static, str>);

impl Topic {
    /// A sale listing was created.
    pub const SALE_CREATED: Topic = Topic(Cow::Borrowed("SALE_CREATED"));
    /// A user signed up.
    pub const USER_CREATED: Topic = Topic(Cow::Borrowed("USER_CREATED"));

    /// A topic with an arbitrary name.
    pub fn new(name: impl Into<String>) -> Self {
        Topic(Cow::Owned(name.into()))
    }

    /// The topic name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct Slot<T> {
    id: u64,
    tx: mpsc::UnboundedSender<T>,
}

struct Registry<T> {
    next_id: u64,
    closed: bool,
    topics: HashMap<Topic, Vec<Slot<T>>>,
}

impl<T> Registry<T> {
    fn remove(&mut self, topic: &Topic, id: u64) -> bool {
        let Some(slots) = self.topics.get_mut(topic) else {
            return false;
        };
        let before = slots.len();
        slots.retain(|slot| slot.id != id);
        let removed = slots.len() != before;
        if slots.is_empty() {
            self.topics.remove(topic);
        }
        removed
    }
}

/// Process-scoped event bus.
///
/// Construct one at startup, share it as `Arc<EventBus<T>>`, and call
/// [`shutdown`](Self::shutdown) on teardown.
///
/// # Examples
///
/// ```
/// use futures::StreamExt;
/// use marketplace_core::{EventBus, Topic};
///
/// let bus = EventBus::new();
/// let topic = Topic::new("greetings");
///
/// // Nobody listening: a no-op.
/// assert_eq!(bus.publish(&topic, "lost"), 0);
///
/// let mut sub = bus.subscribe(&topic);
/// assert_eq!(bus.publish(&topic, "hello"), 1);
/// assert_eq!(futures::executor::block_on(sub.next()), Some("hello"));
///
/// drop(sub);
/// assert_eq!(bus.subscriber_count(&topic), 0);
/// ```
pub struct EventBus<T> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T: Clone + Send> EventBus<T> {
    /// Creates an empty, open bus.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 1,
                closed: false,
                topics: HashMap::new(),
            })),
        }
    }

    /// Delivers `payload` to every current subscriber of `topic`.
    ///
    /// Returns how many subscribers accepted it. Never blocks on consumers.
    pub fn publish(&self, topic: &Topic, payload: T) -> usize {
        let senders: Vec<mpsc::UnboundedSender<T>> = {
            let registry = self.registry.lock();
            match registry.topics.get(topic) {
                Some(slots) => slots.iter().map(|slot| slot.tx.clone()).collect(),
                None => Vec::new(),
            }
        };

        let mut delivered = 0;
        for tx in senders {
            // A failed send means the subscriber dropped after the snapshot.
            if tx.send(payload.clone()).is_ok() {
                delivered += 1;
            }
        }
        tracing::debug!(%topic, delivered, "published event");
        delivered
    }

    /// Registers a subscriber that receives events published from now on.
    ///
    /// After [`shutdown`](Self::shutdown) the returned stream is already closed.
    pub fn subscribe(&self, topic: &Topic) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = self.registry.lock();

        if registry.closed {
            tracing::debug!(%topic, "subscribe after shutdown");
            return Subscription {
                id: 0,
                topic: topic.clone(),
                rx,
                registry: Weak::new(),
            };
        }

        let id = registry.next_id;
        registry.next_id += 1;
        registry
            .topics
            .entry(topic.clone())
            .or_default()
            .push(Slot { id, tx });
        tracing::debug!(%topic, subscriber = id, "subscriber registered");

        Subscription {
            id,
            topic: topic.clone(),
            rx,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Number of live subscribers on `topic`.
    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.registry.lock().topics.get(topic).map_or(0, Vec::len)
    }

    /// Deregisters every subscriber and rejects new ones.
    ///
    /// Open streams yield whatever was already queued, then end.
    pub fn shutdown(&self) {
        let dropped: usize = {
            let mut registry = self.registry.lock();
            registry.closed = true;
            let count = registry.topics.values().map(Vec::len).sum();
            registry.topics.clear();
            count
        };
        tracing::info!(subscribers = dropped, "event bus shut down");
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.registry.lock().closed
    }
}

impl<T: Clone + Send> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for EventBus<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.lock();
        f.debug_struct("EventBus")
            .field("closed", &registry.closed)
            .field("topics", &registry.topics.len())
            .finish()
    }
}

/// A live registration on one topic.
///
/// Yields each payload published after it was created, until it is dropped
/// or the bus shuts down. Dropping it removes the registration immediately.
pub struct Subscription<T> {
    id: u64,
    topic: Topic,
    rx: mpsc::UnboundedReceiver<T>,
    registry: Weak<Mutex<Registry<T>>>,
}

impl<T> Subscription<T> {
    /// The topic this subscription listens on.
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Waits for the next payload; `None` once the bus has shut down.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Returns an already-queued payload without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if registry.lock().remove(&self.topic, self.id) {
                tracing::debug!(topic = %self.topic, subscriber = self.id, "subscriber deregistered");
            }
        }
        self.rx.close();
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn publish_without_subscribers_is_noop() {
        let bus: EventBus<u32> = EventBus::new();
        assert_eq!(bus.publish(&Topic::SALE_CREATED, 1), 0);
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_events() {
        let bus = EventBus::new();
        let mut early = bus.subscribe(&Topic::SALE_CREATED);
        bus.publish(&Topic::SALE_CREATED, 1);
        let mut late = bus.subscribe(&Topic::SALE_CREATED);
        bus.publish(&Topic::SALE_CREATED, 2);

        assert_eq!(early.next().await, Some(1));
        assert_eq!(early.next().await, Some(2));
        assert_eq!(late.next().await, Some(2));
        assert_eq!(late.try_recv(), None);
    }

    #[test]
    fn topics_are_isolated() {
        let bus = EventBus::new();
        let mut sales = bus.subscribe(&Topic::SALE_CREATED);
        let mut users = bus.subscribe(&Topic::USER_CREATED);

        assert_eq!(bus.publish(&Topic::USER_CREATED, "u"), 1);
        assert_eq!(users.try_recv(), Some("u"));
        assert_eq!(sales.try_recv(), None);
    }

    #[test]
    fn drop_deregisters() {
        let bus: EventBus<u8> = EventBus::new();
        let a = bus.subscribe(&Topic::SALE_CREATED);
        let b = bus.subscribe(&Topic::SALE_CREATED);
        assert_eq!(bus.subscriber_count(&Topic::SALE_CREATED), 2);

        drop(a);
        assert_eq!(bus.subscriber_count(&Topic::SALE_CREATED), 1);
        assert_eq!(bus.publish(&Topic::SALE_CREATED, 9), 1);
        drop(b);
        assert_eq!(bus.subscriber_count(&Topic::SALE_CREATED), 0);
    }

    #[tokio::test]
    async fn shutdown_ends_streams_and_rejects_new_subscribers() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe(&Topic::SALE_CREATED);
        bus.publish(&Topic::SALE_CREATED, "queued");
        bus.shutdown();

        assert!(bus.is_shut_down());
        assert_eq!(sub.next().await, Some("queued"));
        assert_eq!(sub.next().await, None);

        let mut after = bus.subscribe(&Topic::SALE_CREATED);
        assert_eq!(after.next().await, None);
        assert_eq!(bus.publish(&Topic::SALE_CREATED, "ignored"), 0);
    }

    #[test]
    fn subscription_outliving_bus_drops_cleanly() {
        let bus: EventBus<u8> = EventBus::new();
        let sub = bus.subscribe(&Topic::new("t"));
        drop(bus);
        drop(sub);
    }
}
