//! Per-client delivery of an event's schedule.
//!
//! A feed sends the current snapshot first, then forwards every snapshot the
//! bus publishes for the same event until the client goes away or the bus
//! shuts down. Delivery is best-effort: while the client is still taking the
//! previous snapshot the bus skips this feed, and the next publish catches it up.

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use lineup_core::{EventId, SubscriberId};
use lineup_events::{BusError, ChangeBus};
use lineup_schedule::EventSnapshot;

use crate::repository::{EventRepository, RepositoryError};

/// Why a feed stopped.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FeedExit {
    ClientClosed,
    BusClosed,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Bus(#[from] BusError),
}

#[derive(Debug, Clone)]
pub struct LiveFeed<R, B> {
    repository: R,
    bus: B,
}

impl<R, B> LiveFeed<R, B> {
    pub fn new(repository: R, bus: B) -> Self {
        Self { repository, bus }
    }
}

impl<R, B> LiveFeed<R, B>
where
    R: EventRepository,
    B: ChangeBus<EventSnapshot>,
{
    /// Stream `event_id`'s schedule into `client` until either side closes.
    pub async fn run(
        &self,
        event_id: EventId,
        client: mpsc::Sender<EventSnapshot>,
    ) -> Result<FeedExit, FeedError> {
        let snapshot = self.repository.load_event(event_id)?.snapshot();
        if client.send(snapshot).await.is_err() {
            return Ok(FeedExit::ClientClosed);
        }

        let mut subscription = self.bus.subscribe()?;
        let _registration = Registration {
            bus: &self.bus,
            id: subscription.id(),
        };
        debug!(event_id = %event_id, subscriber_id = %subscription.id(), "live feed started");

        loop {
            tokio::select! {
                _ = client.closed() => return Ok(FeedExit::ClientClosed),
                message = subscription.recv() => match message {
                    Some(snapshot) if snapshot.id == event_id => {
                        if client.send(snapshot).await.is_err() {
                            return Ok(FeedExit::ClientClosed);
                        }
                    }
                    Some(other) => {
                        trace!(event_id = %event_id, other_event_id = %other.id, "snapshot for another event ignored");
                    }
                    None => return Ok(FeedExit::BusClosed),
                },
            }
        }
    }
}

/// Unsubscribes on drop, on every exit path of [`LiveFeed::run`].
struct Registration<'a, B>
where
    B: ChangeBus<EventSnapshot>,
{
    bus: &'a B,
    id: SubscriberId,
}

impl<B> Drop for Registration<'_, B>
where
    B: ChangeBus<EventSnapshot>,
{
    fn drop(&mut self) {
        match self.bus.unsubscribe(self.id) {
            Ok(()) => debug!(subscriber_id = %self.id, "live feed stopped"),
            // Shutdown or pruning already removed it.
            Err(BusError::UnknownSubscriber(_)) => {
                debug!(subscriber_id = %self.id, "live feed subscriber already removed")
            }
            Err(err) => warn!(subscriber_id = %self.id, error = %err, "live feed unsubscribe failed"),
        }
    }
}
