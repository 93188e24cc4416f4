//! Event Bus: topic-addressed publish/subscribe between actors.
//!
//! The bus maps a topic string to an ordered list of mailbox senders.
//! Publishing wraps the payload in an [`Arc<Message>`] and enqueues one
//! reference onto each mailbox registered for the topic, in registration
//! order.
//!
//! # Backpressure
//!
//! Mailboxes are bounded crossbeam channels. A publish to a full mailbox
//! blocks the publisher until the owner drains it, so one slow subscriber
//! delays delivery to every subscriber registered after it. There is no
//! atomicity across subscribers.
//!
//! A mailbox whose owner has gone away is skipped silently.
//!
//! ```text
//!  publish("clock", Tick) ──▶ registry["clock"] ─┬─▶ player mailbox
//!                                                ├─▶ orb #1 mailbox
//!                                                └─▶ orb #2 mailbox
//! ```

mod message;
pub mod topic;

pub use message::{Message, Payload};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, trace};

/// Default mailbox capacity.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 10;

/// Identifies one registration of a mailbox on a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Registration {
    id: SubscriptionId,
    sender: Sender<Arc<Message>>,
}

#[derive(Default)]
struct Registry {
    topics: RwLock<HashMap<String, Vec<Registration>>>,
    next_id: AtomicU64,
}

/// Handle to a shared subscriber registry. Cloning shares the registry.
#[derive(Clone, Default)]
pub struct Bus {
    registry: Arc<Registry>,
}

impl Bus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `mailbox` for every future message on `topic`.
    ///
    /// Registering the same mailbox twice yields two deliveries per publish.
    pub fn subscribe(&self, topic: &str, mailbox: &Mailbox) -> SubscriptionId {
        let id = SubscriptionId(self.registry.next_id.fetch_add(1, Ordering::Relaxed));
        let mut topics = self
            .registry
            .topics
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        topics.entry(topic.to_string()).or_default().push(Registration {
            id,
            sender: mailbox.sender.clone(),
        });
        debug!(topic, id = id.0, "subscribed");
        id
    }

    /// Remove one registration. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, topic: &str, id: SubscriptionId) -> bool {
        let mut topics = self
            .registry
            .topics
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(list) = topics.get_mut(topic) else {
            return false;
        };
        let before = list.len();
        list.retain(|r| r.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            topics.remove(topic);
        }
        if removed {
            debug!(topic, id = id.0, "unsubscribed");
        }
        removed
    }

    /// Deliver `payload` to every mailbox currently registered on `topic`.
    ///
    /// Blocks while any target mailbox is full. The registry lock is not
    /// held while blocked, so subscribers may come and go meanwhile; the
    /// set of targets is fixed at the moment of the call.
    pub fn publish(&self, topic: &str, payload: Payload) {
        let targets: Vec<Sender<Arc<Message>>> = {
            let topics = self
                .registry
                .topics
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            match topics.get(topic) {
                Some(list) => list.iter().map(|r| r.sender.clone()).collect(),
                None => Vec::new(),
            }
        };
        if targets.is_empty() {
            trace!(topic, "no subscribers, message discarded");
            return;
        }

        let message = Arc::new(Message::new(topic, payload));
        for target in targets {
            if target.send(Arc::clone(&message)).is_err() {
                trace!(topic, "mailbox closed, delivery skipped");
            }
        }
    }

    /// Number of registrations on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.registry
            .topics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(topic)
            .map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let topics = self
            .registry
            .topics
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Bus").field("topics", &topics.len()).finish()
    }
}

/// A bounded FIFO of messages owned by a single actor.
///
/// The bus is the only outside writer; the owning life loop is the only
/// reader. Dropping the mailbox closes it for every registration.
#[derive(Debug)]
pub struct Mailbox {
    sender: Sender<Arc<Message>>,
    receiver: Receiver<Arc<Message>>,
}

impl Mailbox {
    /// Create a mailbox holding at most `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// The receiving end, for use in `select!`.
    #[inline]
    pub const fn receiver(&self) -> &Receiver<Arc<Message>> {
        &self.receiver
    }

    /// Take the next message if one is queued.
    pub fn try_recv(&self) -> Option<Arc<Message>> {
        self.receiver.try_recv().ok()
    }

    /// Wait up to `timeout` for the next message.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Arc<Message>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(message) => Some(message),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether no messages are queued.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new(DEFAULT_MAILBOX_CAPACITY)
    }
}

/// Registrations that are removed when this guard is dropped.
///
/// Each actor keeps one for the lifetime of its life loop, so an exiting
/// actor leaves nothing behind in the registry.
#[derive(Debug)]
pub struct Subscriptions {
    bus: Bus,
    entries: Vec<(&'static str, SubscriptionId)>,
}

impl Subscriptions {
    /// Subscribe `mailbox` to each topic in order.
    pub fn new(bus: &Bus, topics: &[&'static str], mailbox: &Mailbox) -> Self {
        let entries = topics
            .iter()
            .map(|&topic| (topic, bus.subscribe(topic, mailbox)))
            .collect();
        Self {
            bus: bus.clone(),
            entries,
        }
    }

    /// Number of registrations held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the guard holds no registrations.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        for (topic, id) in self.entries.drain(..) {
            self.bus.unsubscribe(topic, id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn text(s: &str) -> Payload {
        Payload::Text(s.to_string())
    }

    #[test]
    fn test_every_subscriber_gets_one_copy() {
        let bus = Bus::new();
        let a = Mailbox::new(4);
        let b = Mailbox::new(4);
        bus.subscribe("t", &a);
        bus.subscribe("t", &b);

        bus.publish("t", text("hello"));

        for mailbox in [&a, &b] {
            let msg = mailbox.try_recv().expect("delivered");
            assert!(msg.is("t"));
            assert_eq!(msg.payload, text("hello"));
            assert!(mailbox.try_recv().is_none());
        }
    }

    #[test]
    fn test_messages_arrive_in_publish_order() {
        let bus = Bus::new();
        let mailbox = Mailbox::new(8);
        bus.subscribe("t", &mailbox);
        for i in 0..5 {
            bus.publish("t", Payload::Position { x: i, y: 0 });
        }
        for i in 0..5 {
            assert_eq!(mailbox.try_recv().unwrap().payload, Payload::Position { x: i, y: 0 });
        }
    }

    #[test]
    fn test_late_subscriber_misses_earlier_messages() {
        let bus = Bus::new();
        let early = Mailbox::new(4);
        bus.subscribe("t", &early);
        bus.publish("t", text("first"));

        let late = Mailbox::new(4);
        bus.subscribe("t", &late);
        assert!(late.try_recv().is_none());
        assert_eq!(early.len(), 1);
    }

    #[test]
    fn test_duplicate_subscription_delivers_twice() {
        let bus = Bus::new();
        let mailbox = Mailbox::new(4);
        bus.subscribe("t", &mailbox);
        bus.subscribe("t", &mailbox);
        bus.publish("t", text("x"));
        assert_eq!(mailbox.len(), 2);
        assert_eq!(bus.subscriber_count("t"), 2);
    }

    #[test]
    fn test_publish_without_subscribers_is_discarded() {
        let bus = Bus::new();
        bus.publish("nobody", text("x"));
        assert_eq!(bus.subscriber_count("nobody"), 0);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus = Bus::new();
        let mailbox = Mailbox::new(4);
        let id = bus.subscribe("t", &mailbox);
        assert!(bus.unsubscribe("t", id));
        assert!(!bus.unsubscribe("t", id));
        bus.publish("t", text("x"));
        assert!(mailbox.is_empty());
    }

    #[test]
    fn test_closed_mailbox_is_skipped() {
        let bus = Bus::new();
        let gone = Mailbox::new(1);
        let alive = Mailbox::new(4);
        bus.subscribe("t", &gone);
        bus.subscribe("t", &alive);
        drop(gone);
        bus.publish("t", text("x"));
        bus.publish("t", text("y"));
        assert_eq!(alive.len(), 2);
    }

    #[test]
    fn test_subscriptions_guard_unsubscribes_on_drop() {
        let bus = Bus::new();
        let mailbox = Mailbox::new(4);
        {
            let subs = Subscriptions::new(&bus, &[topic::CLOCK, topic::QUIT], &mailbox);
            assert_eq!(subs.len(), 2);
            assert_eq!(bus.subscriber_count(topic::CLOCK), 1);
        }
        assert_eq!(bus.subscriber_count(topic::CLOCK), 0);
        assert_eq!(bus.subscriber_count(topic::QUIT), 0);
    }

    #[test]
    fn test_full_mailbox_blocks_publisher() {
        let bus = Bus::new();
        let mailbox = Mailbox::new(1);
        bus.subscribe("t", &mailbox);
        bus.publish("t", text("fills"));

        let (done_tx, done_rx) = bounded(1);
        let publisher = {
            let bus = bus.clone();
            thread::spawn(move || {
                bus.publish("t", text("blocked"));
                let _ = done_tx.send(());
            })
        };

        assert!(done_rx.recv_timeout(Duration::from_millis(50)).is_err());
        assert_eq!(mailbox.try_recv().unwrap().payload, text("fills"));
        assert!(done_rx.recv_timeout(Duration::from_secs(2)).is_ok());
        assert_eq!(mailbox.try_recv().unwrap().payload, text("blocked"));
        publisher.join().unwrap();
    }

    #[test]
    fn test_full_subscriber_stalls_later_subscribers() {
        let bus = Bus::new();
        let first = Mailbox::new(1);
        let second = Mailbox::new(4);
        bus.subscribe("t", &first);
        bus.subscribe("t", &second);
        bus.publish("t", text("fills"));
        assert_eq!(second.try_recv().unwrap().payload, text("fills"));

        let publisher = {
            let bus = bus.clone();
            thread::spawn(move || bus.publish("t", text("stalled")))
        };

        // Delivery goes in registration order, so `second` waits on `first`.
        thread::sleep(Duration::from_millis(50));
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());

        assert_eq!(first.try_recv().unwrap().payload, text("fills"));
        let delivered = second.recv_timeout(Duration::from_secs(2)).expect("delivered");
        assert_eq!(delivered.payload, text("stalled"));
        publisher.join().unwrap();
        assert_eq!(first.try_recv().unwrap().payload, text("stalled"));
    }

    #[test]
    fn test_quit_payload() {
        assert!(Payload::quit().is_quit());
        assert!(!Payload::Control("open".into()).is_quit());
        assert!(!Payload::Text("quit".into()).is_quit());
    }
}
