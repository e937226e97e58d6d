use std::sync::Arc;
use std::time::Duration;

use lineup_events::{ChangeBus, InMemoryChangeBus};
use lineup_infra::{InMemoryEventRepository, LiveFeed, ScheduleService};
use lineup_schedule::EventSnapshot;

use crate::config::Settings;

pub type Repository = Arc<InMemoryEventRepository>;
pub type SnapshotBus = Arc<InMemoryChangeBus<EventSnapshot>>;

/// SSE framing options.
#[derive(Debug, Copy, Clone)]
pub struct StreamSettings {
    pub retry: Duration,
    pub keep_alive: Duration,
}

/// Shared application services, injected into handlers as an `Extension`.
#[derive(Debug)]
pub struct AppServices {
    pub schedule: ScheduleService<Repository, SnapshotBus>,
    pub feed: LiveFeed<Repository, SnapshotBus>,
    pub stream: StreamSettings,
    bus: SnapshotBus,
}

impl AppServices {
    pub fn in_memory(settings: &Settings) -> Self {
        let repository: Repository = Arc::new(InMemoryEventRepository::new());
        let bus: SnapshotBus = Arc::new(InMemoryChangeBus::with_capacity(
            settings.subscriber_capacity,
        ));

        Self {
            schedule: ScheduleService::new(repository.clone(), bus.clone()),
            feed: LiveFeed::new(repository, bus.clone()),
            stream: StreamSettings {
                retry: settings.sse_retry,
                keep_alive: settings.sse_keep_alive,
            },
            bus,
        }
    }

    /// Number of open live feeds.
    pub fn viewer_count(&self) -> usize {
        self.bus.subscriber_count()
    }

    /// End every live feed; new feeds are refused afterwards.
    pub fn shutdown(&self) {
        self.bus.shutdown();
    }
}
