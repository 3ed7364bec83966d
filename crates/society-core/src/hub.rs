//! Fan-out of observer events and the per-agent injection queue.
//!
//! The hub is an explicit component shared as `Arc<Hub>` between the
//! scheduler and the observer server. Nothing in it ever waits:
//!
//! - Each subscriber has a bounded queue. [`Hub::broadcast`] serializes the
//!   event once and offers it with `try_send`; a full queue drops the event
//!   for that subscriber only, and a closed one is pruned.
//! - Injections are kept per agent in arrival order.
//!   [`Hub::drain_injections`] removes and returns them in one step, so a
//!   message is delivered at most once.
//!
//! The subscriber map and the injection map sit behind independent
//! `std::sync` locks held only for the duration of a map operation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use society_types::{AgentId, ObserverEvent};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{trace, warn};

/// Errors raised by the hub.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The injected message was empty or whitespace.
    #[error("injected message must not be empty")]
    EmptyMessage,
}

/// An observer's registration with the hub.
///
/// Dropping it without calling [`Hub::unsubscribe`] is safe: the closed
/// queue is pruned on the next broadcast.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    rx: mpsc::Receiver<Arc<str>>,
}

impl Subscription {
    /// Identifier assigned at subscribe time.
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the next serialized event. `None` once unsubscribed.
    pub async fn recv(&mut self) -> Option<Arc<str>> {
        self.rx.recv().await
    }

    /// Take the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<Arc<str>> {
        self.rx.try_recv().ok()
    }
}

/// Event fan-out and injection queue.
#[derive(Debug)]
pub struct Hub {
    capacity: usize,
    next_id: AtomicU64,
    subscribers: RwLock<HashMap<u64, mpsc::Sender<Arc<str>>>>,
    injections: Mutex<HashMap<AgentId, Vec<String>>>,
}

impl Hub {
    /// Create a hub whose subscribers each buffer up to `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            next_id: AtomicU64::new(0),
            subscribers: RwLock::new(HashMap::new()),
            injections: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new observer.
    pub fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.capacity);
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, tx);
        trace!(subscriber = id, "observer subscribed");
        Subscription { id, rx }
    }

    /// Deregister an observer and release its queue.
    pub fn unsubscribe(&self, subscription: Subscription) {
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&subscription.id);
        trace!(subscriber = subscription.id, "observer unsubscribed");
    }

    /// Number of registered observers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Offer an event to every observer. Returns the number of queues that
    /// accepted it.
    pub fn broadcast(&self, event: &ObserverEvent) -> usize {
        let payload: Arc<str> = match serde_json::to_string(event) {
            Ok(json) => Arc::from(json),
            Err(e) => {
                warn!(error = %e, "failed to serialize observer event");
                return 0;
            }
        };

        let mut delivered: usize = 0;
        let mut closed = Vec::new();
        {
            let subscribers = self
                .subscribers
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            for (id, tx) in subscribers.iter() {
                match tx.try_send(Arc::clone(&payload)) {
                    Ok(()) => delivered = delivered.saturating_add(1),
                    Err(TrySendError::Full(_)) => {
                        trace!(subscriber = id, "observer queue full, event dropped");
                    }
                    Err(TrySendError::Closed(_)) => closed.push(*id),
                }
            }
        }

        if !closed.is_empty() {
            let mut subscribers = self
                .subscribers
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            for id in closed {
                subscribers.remove(&id);
            }
        }
        delivered
    }

    /// Queue a human message for an agent's next cognitive cycle.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::EmptyMessage`] if `message` is blank.
    pub fn inject(&self, agent_id: AgentId, message: &str) -> Result<(), HubError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(HubError::EmptyMessage);
        }
        self.injections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(agent_id)
            .or_default()
            .push(message.to_owned());
        Ok(())
    }

    /// Remove and return every pending injection for an agent, oldest first.
    pub fn drain_injections(&self, agent_id: AgentId) -> Vec<String> {
        self.injections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&agent_id)
            .unwrap_or_default()
    }

    /// Number of injections waiting for an agent.
    pub fn pending_injections(&self, agent_id: AgentId) -> usize {
        self.injections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&agent_id)
            .map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use society_types::ConversationEvent;

    use super::*;

    fn conversation(tick: u64) -> ObserverEvent {
        ObserverEvent::Conversation(ConversationEvent {
            speaker_name: "Ada".to_owned(),
            target_name: "Bo".to_owned(),
            content: "Hello".to_owned(),
            agent_id: AgentId::new(),
            tick,
        })
    }

    #[test]
    fn broadcast_reaches_every_subscriber() {
        let hub = Hub::new(4);
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();
        assert_eq!(hub.broadcast(&conversation(1)), 2);

        let payload = a.try_recv();
        assert!(payload.is_some());
        let json: serde_json::Value =
            serde_json::from_str(&payload.unwrap_or_else(|| Arc::from("{}"))).unwrap_or_default();
        assert_eq!(json["type"], "conversation");
        assert_eq!(json["speakerName"], "Ada");
        assert!(b.try_recv().is_some());
    }

    #[test]
    fn full_queue_drops_for_that_subscriber_only() {
        let hub = Hub::new(1);
        let mut slow = hub.subscribe();
        let mut fast = hub.subscribe();

        assert_eq!(hub.broadcast(&conversation(1)), 2);
        assert!(fast.try_recv().is_some());
        // `slow` still holds tick 1, so tick 2 is dropped for it.
        assert_eq!(hub.broadcast(&conversation(2)), 1);
        assert!(fast.try_recv().is_some());

        assert!(slow.try_recv().is_some());
        assert!(slow.try_recv().is_none());
    }

    #[test]
    fn unsubscribe_and_dropped_subscribers_are_removed() {
        let hub = Hub::new(4);
        let a = hub.subscribe();
        let b = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);

        hub.unsubscribe(a);
        assert_eq!(hub.subscriber_count(), 1);

        drop(b);
        assert_eq!(hub.broadcast(&ObserverEvent::Connected), 0);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn drain_twice_returns_nothing_the_second_time() {
        let hub = Hub::new(4);
        let agent = AgentId::new();
        assert!(hub.inject(agent, "ask about their day").is_ok());
        assert!(hub.inject(agent, "mention the weather").is_ok());
        assert_eq!(hub.pending_injections(agent), 2);

        assert_eq!(
            hub.drain_injections(agent),
            ["ask about their day", "mention the weather"]
        );
        assert!(hub.drain_injections(agent).is_empty());
        assert_eq!(hub.pending_injections(agent), 0);
    }

    #[test]
    fn injections_are_per_agent() {
        let hub = Hub::new(4);
        let a = AgentId::new();
        let b = AgentId::new();
        assert!(hub.inject(a, "for a").is_ok());
        assert!(hub.drain_injections(b).is_empty());
        assert_eq!(hub.drain_injections(a), ["for a"]);
    }

    #[test]
    fn blank_injection_is_rejected() {
        let hub = Hub::new(4);
        let agent = AgentId::new();
        assert!(matches!(hub.inject(agent, "  \n"), Err(HubError::EmptyMessage)));
        assert_eq!(hub.pending_injections(agent), 0);
    }
}
