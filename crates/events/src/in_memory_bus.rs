//! In-process change bus backed by bounded tokio channels.

use std::collections::HashMap;
use std::sync::Mutex;

use lineup_core::SubscriberId;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, trace};

use crate::bus::{BusError, ChangeBus, Delivery, Subscription};

/// Per-subscriber channel capacity used by [`InMemoryChangeBus::new`].
///
/// One slot: a subscriber that has not yet taken the previous message misses the next.
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 1;

#[derive(Debug)]
struct Registry<M> {
    subscribers: HashMap<SubscriberId, mpsc::Sender<M>>,
    closed: bool,
}

/// In-memory pub/sub bus.
///
/// - One `Mutex`-guarded registry, locked only for the map read/mutation
/// - `try_send` fan-out: never blocks, drops on a full channel
/// - Independent instances (no global state), so tests can run many buses
#[derive(Debug)]
pub struct InMemoryChangeBus<M> {
    registry: Mutex<Registry<M>>,
    capacity: usize,
}

impl<M> InMemoryChangeBus<M> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SUBSCRIBER_CAPACITY)
    }

    /// Bus whose subscriber channels hold up to `capacity` undelivered messages.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            registry: Mutex::new(Registry {
                subscribers: HashMap::new(),
                closed: false,
            }),
            capacity: capacity.max(1),
        }
    }

    /// Number of currently registered subscribers (0 if the lock is poisoned).
    pub fn subscriber_count(&self) -> usize {
        self.registry
            .lock()
            .map(|r| r.subscribers.len())
            .unwrap_or(0)
    }

    pub fn is_subscribed(&self, id: SubscriberId) -> bool {
        self.registry
            .lock()
            .map(|r| r.subscribers.contains_key(&id))
            .unwrap_or(false)
    }
}

impl<M> Default for InMemoryChangeBus<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> ChangeBus<M> for InMemoryChangeBus<M>
where
    M: Clone + Send + 'static,
{
    fn subscribe(&self) -> Result<Subscription<M>, BusError> {
        let mut registry = self.registry.lock().map_err(|_| BusError::Poisoned)?;
        if registry.closed {
            return Err(BusError::Closed);
        }

        let id = SubscriberId::new();
        let (tx, rx) = mpsc::channel(self.capacity);
        registry.subscribers.insert(id, tx);
        debug!(subscriber_id = %id, subscribers = registry.subscribers.len(), "subscriber registered");

        Ok(Subscription::new(id, rx))
    }

    fn unsubscribe(&self, id: SubscriberId) -> Result<(), BusError> {
        let mut registry = self.registry.lock().map_err(|_| BusError::Poisoned)?;

        // Dropping the sender closes the subscriber's channel.
        match registry.subscribers.remove(&id) {
            Some(_) => {
                debug!(subscriber_id = %id, subscribers = registry.subscribers.len(), "subscriber removed");
                Ok(())
            }
            None => Err(BusError::UnknownSubscriber(id)),
        }
    }

    fn publish(&self, message: M) -> Result<Delivery, BusError> {
        let mut registry = self.registry.lock().map_err(|_| BusError::Poisoned)?;
        if registry.closed {
            return Err(BusError::Closed);
        }
        let mut delivery = Delivery::default();

        registry
            .subscribers
            .retain(|id, tx| match tx.try_send(message.clone()) {
                Ok(()) => {
                    delivery.delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    trace!(subscriber_id = %id, "subscriber busy; message skipped");
                    delivery.skipped += 1;
                    true
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(subscriber_id = %id, "subscriber receiver gone; pruned");
                    delivery.pruned += 1;
                    false
                }
            });

        Ok(delivery)
    }

    fn shutdown(&self) {
        // A poisoned registry is still cleared: shutdown must release every channel.
        let mut registry = match self.registry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let closed = registry.subscribers.len();
        registry.subscribers.clear();
        registry.closed = true;
        debug!(closed, "change bus shut down");
    }
}
