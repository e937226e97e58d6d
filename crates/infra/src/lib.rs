//! Infrastructure layer: storage collaborator, command orchestration and live delivery.

pub mod live_feed;
pub mod repository;
pub mod schedule_service;


pub use live_feed::{FeedError, FeedExit, LiveFeed};
pub use repository::{EventRepository, InMemoryEventRepository, RepositoryError};
pub use schedule_service::{DispatchError, ScheduleService};
