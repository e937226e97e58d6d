//! Change publishing/subscription abstraction (mechanics only).
//!
//! This module provides the **change bus pattern**: a pub/sub registry that decouples
//! "an event's schedule changed" from "deliver the new schedule to every viewer".
//!
//! ## Delivery Semantics
//!
//! The bus is intentionally **lossy**:
//!
//! - **At-most-once, best-effort**: each subscriber has a small bounded channel. If a
//!   subscriber has not consumed the previous message its channel is full and it simply
//!   misses the new one.
//! - **Non-blocking publish**: `publish()` never waits on a subscriber, so one stalled
//!   viewer cannot delay any other viewer or the mutation path.
//! - **No replay**: a late subscriber only sees messages published after it subscribed.
//!
//! Payloads are full snapshots, not diffs, so a skipped message is repaired by the next one.
//!
//! ## Lifecycle
//!
//! ```text
//! subscribe() ──► Subscription { id, receiver }
//!                    │
//!     publish() ─────┤  try_send per subscriber (full → skipped, closed → pruned)
//!                    │
//! unsubscribe(id) ───┘  channel closed, registry entry removed
//! shutdown()            every channel closed, registry cleared, bus closed
//! ```

use std::sync::Arc;

use lineup_core::SubscriberId;
use thiserror::Error;
use tokio::sync::mpsc;

/// Bus-level failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// `unsubscribe` was called with an id that is not (or no longer) registered.
    #[error("unknown subscriber: {0}")]
    UnknownSubscriber(SubscriberId),

    /// The bus has been shut down; it accepts no subscribers or messages.
    #[error("bus is shut down")]
    Closed,

    /// Internal registry lock poisoning.
    #[error("subscriber registry lock poisoned")]
    Poisoned,
}

/// Outcome of a single `publish`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Subscribers that received the message.
    pub delivered: usize,
    /// Subscribers whose channel was full; they missed this message.
    pub skipped: usize,
    /// Subscribers whose receiver was already gone; removed from the registry.
    pub pruned: usize,
}

/// A registered subscription: the subscriber id plus its receiving channel.
///
/// The bus owns the registry entry. Holders must hand the id back through
/// `ChangeBus::unsubscribe` when they stop listening.
#[derive(Debug)]
pub struct Subscription<M> {
    id: SubscriberId,
    receiver: mpsc::Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(id: SubscriberId, receiver: mpsc::Receiver<M>) -> Self {
        Self { id, receiver }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next message. `None` once the bus closed this channel.
    pub async fn recv(&mut self) -> Option<M> {
        self.receiver.recv().await
    }

    /// Try to receive a message without waiting.
    pub fn try_recv(&mut self) -> Result<M, mpsc::error::TryRecvError> {
        self.receiver.try_recv()
    }
}

/// Domain-agnostic change bus (pub/sub registry).
///
/// Implementations must be `Send + Sync`: mutation handlers publish from many request
/// tasks while live feeds subscribe and unsubscribe concurrently.
pub trait ChangeBus<M>: Send + Sync {
    /// Register a new subscriber with a fresh id and a dedicated channel.
    fn subscribe(&self) -> Result<Subscription<M>, BusError>;

    /// Remove and close a subscriber's channel.
    ///
    /// Not idempotent: a second call with the same id returns
    /// [`BusError::UnknownSubscriber`].
    fn unsubscribe(&self, id: SubscriberId) -> Result<(), BusError>;

    /// Deliver `message` to every registered subscriber without blocking.
    fn publish(&self, message: M) -> Result<Delivery, BusError>;

    /// Close every subscriber channel and clear the registry. Not restartable.
    fn shutdown(&self);
}

impl<M, B> ChangeBus<M> for Arc<B>
where
    B: ChangeBus<M> + ?Sized,
{
    fn subscribe(&self) -> Result<Subscription<M>, BusError> {
        (**self).subscribe()
    }

    fn unsubscribe(&self, id: SubscriberId) -> Result<(), BusError> {
        (**self).unsubscribe(id)
    }

    fn publish(&self, message: M) -> Result<Delivery, BusError> {
        (**self).publish(message)
    }

    fn shutdown(&self) {
        (**self).shutdown()
    }
}
