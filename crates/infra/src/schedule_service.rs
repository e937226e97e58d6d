//! Command execution pipeline for the lineup.
//!
//! ```text
//! Command
//!   ↓
//! 1. Load the event (header, slots, markers) ┐
//!   ↓                                         │ one repository
//! 2. Handle command (pure decision logic)     │ transaction
//!   ↓                                         │
//! 3. Commit the changes                       ┘
//!   ↓
//! 4. Render a snapshot of the updated aggregate
//!   ↓
//! 5. Publish the snapshot on the change bus (best-effort)
//! ```
//!
//! Nothing is published unless the commit succeeded. A publish failure is
//! logged and does not fail the command: the change is already durable and the
//! next successful mutation republishes the full schedule.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use lineup_core::{Aggregate, DomainError, EventId, MarkerId, PerformerId, SlotId};
use lineup_events::{Change, ChangeBus};
use lineup_schedule::{
    AddSlot, DeleteMarker, Event, EventDetails, EventSnapshot, MoveSlot, OPEN_MIC, Performer,
    RemovePerformer, RenameSlot, ScheduleCommand, SetMarker, SetNowPlaying, SetUnitCount,
};

use crate::repository::{EventRepository, RepositoryError};

/// How far back an event still counts as upcoming.
const UPCOMING_GRACE_HOURS: i64 = 24;
/// An open mic is "current" from 30h before its start until 8h after.
const CURRENT_LEAD_HOURS: i64 = 30;
const CURRENT_TRAIL_HOURS: i64 = 8;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Deterministic input failure.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Move anchors are not neighbours.
    #[error("invalid order bounds: {0}")]
    InvalidOrderBounds(String),

    #[error("not found")]
    NotFound,

    /// Invariant violation or corrupt stored data.
    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                DispatchError::Validation(msg)
            }
            DomainError::InvalidOrderBounds(msg) => DispatchError::InvalidOrderBounds(msg),
            DomainError::NotFound => DispatchError::NotFound,
            DomainError::InvariantViolation(msg)
            | DomainError::InvalidOrderKey(msg)
            | DomainError::OrderKeyExhausted(msg) => DispatchError::Internal(msg),
        }
    }
}

/// Orchestrates lineup commands and event lifecycle operations.
///
/// - `R`: repository collaborator
/// - `B`: change bus carrying full snapshots to live feeds
#[derive(Debug)]
pub struct ScheduleService<R, B> {
    repository: R,
    bus: B,
}

impl<R, B> ScheduleService<R, B> {
    pub fn new(repository: R, bus: B) -> Self {
        Self { repository, bus }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

impl<R, B> ScheduleService<R, B>
where
    R: EventRepository,
    B: ChangeBus<EventSnapshot>,
{
    /// Run one command against an event and return the resulting snapshot.
    ///
    /// A command that decides no changes (missing slot, already in place)
    /// returns the unchanged snapshot without committing or publishing.
    pub fn dispatch(
        &self,
        event_id: EventId,
        command: ScheduleCommand,
    ) -> Result<EventSnapshot, DispatchError> {
        let (event, changes) = self.repository.transact(event_id, |event| {
            event.handle(&command).map_err(|err| {
                let err = DispatchError::from(err);
                if let DispatchError::Internal(msg) = &err {
                    error!(event_id = %event_id, command = command.name(), error = %msg, "schedule invariant failure");
                }
                err
            })
        })?;

        if changes.is_empty() {
            debug!(event_id = %event_id, command = command.name(), "command produced no changes");
            return Ok(event.snapshot());
        }

        info!(
            event_id = %event_id,
            command = command.name(),
            changes = ?changes.iter().map(Change::change_type).collect::<Vec<_>>(),
            "schedule command committed"
        );

        let snapshot = event.snapshot();
        self.publish(snapshot.clone());
        Ok(snapshot)
    }

    /// Append a performer to the end of the lineup.
    pub fn add_performer(
        &self,
        event_id: EventId,
        performer: Performer,
        unit_count: u32,
    ) -> Result<EventSnapshot, DispatchError> {
        self.dispatch(
            event_id,
            ScheduleCommand::AddSlot(AddSlot {
                slot_id: SlotId::new(),
                performer,
                unit_count,
            }),
        )
    }

    pub fn remove_performer(
        &self,
        event_id: EventId,
        performer_id: PerformerId,
    ) -> Result<EventSnapshot, DispatchError> {
        self.dispatch(
            event_id,
            ScheduleCommand::RemovePerformer(RemovePerformer { performer_id }),
        )
    }

    /// Reposition one slot; see [`MoveSlot`] for how the anchors are read.
    pub fn move_slot(&self, event_id: EventId, mv: MoveSlot) -> Result<EventSnapshot, DispatchError> {
        self.dispatch(event_id, ScheduleCommand::MoveSlot(mv))
    }

    /// Apply slot edits; either field may be absent.
    pub fn update_slot(
        &self,
        event_id: EventId,
        slot_id: SlotId,
        unit_count: Option<u32>,
        name_override: Option<Option<String>>,
    ) -> Result<EventSnapshot, DispatchError> {
        let mut snapshot = None;
        if let Some(unit_count) = unit_count {
            snapshot = Some(self.dispatch(
                event_id,
                ScheduleCommand::SetUnitCount(SetUnitCount {
                    slot_id,
                    unit_count,
                }),
            )?);
        }
        if let Some(name_override) = name_override {
            snapshot = Some(self.dispatch(
                event_id,
                ScheduleCommand::RenameSlot(RenameSlot {
                    slot_id,
                    name_override,
                }),
            )?);
        }
        match snapshot {
            Some(snapshot) => Ok(snapshot),
            None => self.get_event(event_id),
        }
    }

    pub fn set_marker(
        &self,
        event_id: EventId,
        slot_index: u32,
        display: impl Into<String>,
    ) -> Result<EventSnapshot, DispatchError> {
        self.dispatch(
            event_id,
            ScheduleCommand::SetMarker(SetMarker {
                marker_id: MarkerId::new(),
                slot_index,
                display: display.into(),
            }),
        )
    }

    pub fn delete_marker(
        &self,
        event_id: EventId,
        marker_id: MarkerId,
    ) -> Result<EventSnapshot, DispatchError> {
        self.dispatch(
            event_id,
            ScheduleCommand::DeleteMarker(DeleteMarker { marker_id }),
        )
    }

    pub fn set_now_playing(
        &self,
        event_id: EventId,
        slot_index: u32,
    ) -> Result<EventSnapshot, DispatchError> {
        self.dispatch(
            event_id,
            ScheduleCommand::SetNowPlaying(SetNowPlaying {
                marker_id: MarkerId::new(),
                slot_index,
            }),
        )
    }

    pub fn get_event(&self, event_id: EventId) -> Result<EventSnapshot, DispatchError> {
        Ok(self.repository.load_event(event_id)?.snapshot())
    }

    pub fn create_event(&self, details: EventDetails) -> Result<EventSnapshot, DispatchError> {
        details.validate()?;
        let event = Event::new(EventId::new(), details);
        self.repository.create_event(&event)?;
        info!(event_id = %event.id_typed(), event_type = event.event_type(), "event created");
        Ok(event.snapshot())
    }

    /// Replace an event's header; viewers receive the new snapshot.
    pub fn update_event(
        &self,
        event_id: EventId,
        details: EventDetails,
    ) -> Result<EventSnapshot, DispatchError> {
        details.validate()?;
        let event = self.repository.update_event(event_id, &details)?;
        info!(event_id = %event_id, "event updated");

        let snapshot = event.snapshot();
        self.publish(snapshot.clone());
        Ok(snapshot)
    }

    pub fn delete_event(&self, event_id: EventId) -> Result<(), DispatchError> {
        self.repository.delete_event(event_id)?;
        info!(event_id = %event_id, "event deleted");
        Ok(())
    }

    /// Events starting no earlier than 24 hours before `now`, soonest first.
    pub fn upcoming_events(&self, now: DateTime<Utc>) -> Result<Vec<EventSnapshot>, DispatchError> {
        let cutoff = now - Duration::hours(UPCOMING_GRACE_HOURS);
        Ok(self
            .repository
            .list_events()?
            .iter()
            .filter(|e| e.start_time() >= cutoff)
            .map(Event::snapshot)
            .collect())
    }

    /// The open mic running now or starting soon, if any.
    pub fn current_event(&self, now: DateTime<Utc>) -> Result<Option<EventSnapshot>, DispatchError> {
        let earliest = now - Duration::hours(CURRENT_TRAIL_HOURS);
        let latest = now + Duration::hours(CURRENT_LEAD_HOURS);
        Ok(self
            .repository
            .list_events()?
            .iter()
            .find(|e| {
                e.event_type() == OPEN_MIC && e.start_time() >= earliest && e.start_time() <= latest
            })
            .map(Event::snapshot))
    }

    fn publish(&self, snapshot: EventSnapshot) {
        let event_id = snapshot.id;
        match self.bus.publish(snapshot) {
            Ok(delivery) => debug!(
                event_id = %event_id,
                delivered = delivery.delivered,
                skipped = delivery.skipped,
                pruned = delivery.pruned,
                "snapshot published"
            ),
            Err(err) => warn!(event_id = %event_id, error = %err, "snapshot publish failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::TimeZone;
    use lineup_events::InMemoryChangeBus;

    use crate::repository::InMemoryEventRepository;

    type Service = ScheduleService<InMemoryEventRepository, Arc<InMemoryChangeBus<EventSnapshot>>>;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 3, 21, 0, 0).unwrap()
    }

    fn details_at(start_time: DateTime<Utc>, event_type: &str) -> EventDetails {
        EventDetails {
            start_time,
            end_time: start_time + Duration::hours(3),
            event_type: event_type.to_string(),
        }
    }

    fn setup() -> (Service, Arc<InMemoryChangeBus<EventSnapshot>>, EventId) {
        let bus = Arc::new(InMemoryChangeBus::with_capacity(16));
        let service = ScheduleService::new(InMemoryEventRepository::new(), bus.clone());
        let event_id = service.create_event(details_at(start(), OPEN_MIC)).unwrap().id;
        (service, bus, event_id)
    }

    fn performer(name: &str) -> Performer {
        Performer::new(PerformerId::new(), name)
    }

    #[tokio::test]
    async fn committed_command_publishes_snapshot() {
        let (service, bus, event_id) = setup();
        let mut sub = bus.subscribe().unwrap();

        let snapshot = service.add_performer(event_id, performer("Ada"), 2).unwrap();

        assert_eq!(snapshot.time_slots.len(), 1);
        assert_eq!(snapshot.time_slots[0].song_count, 2);
        assert_eq!(sub.recv().await, Some(snapshot));
    }

    #[test]
    fn noop_command_neither_commits_nor_publishes() {
        let (service, bus, event_id) = setup();
        let mut sub = bus.subscribe().unwrap();

        let snapshot = service
            .move_slot(
                event_id,
                MoveSlot {
                    slot_id: SlotId::new(),
                    before_slot_id: None,
                    after_slot_id: Some(SlotId::new()),
                },
            )
            .unwrap();

        assert!(snapshot.time_slots.is_empty());
        assert!(sub.try_recv().is_err());
    }

    #[test]
    fn rejected_command_is_not_published() {
        let (service, bus, event_id) = setup();
        let mut sub = bus.subscribe().unwrap();

        let err = service.add_performer(event_id, performer("Ada"), 0).unwrap_err();

        assert!(matches!(err, DispatchError::Validation(_)));
        assert!(sub.try_recv().is_err());
    }

    #[test]
    fn non_adjacent_anchors_map_to_invalid_bounds() {
        let (service, _bus, event_id) = setup();
        for name in ["A", "B", "C"] {
            service.add_performer(event_id, performer(name), 1).unwrap();
        }
        let ids: Vec<SlotId> = service
            .get_event(event_id)
            .unwrap()
            .time_slots
            .iter()
            .map(|s| s.id)
            .collect();

        // With B lifted out, "after C" and "before A" leave no gap to land in.
        let err = service
            .move_slot(
                event_id,
                MoveSlot {
                    slot_id: ids[1],
                    before_slot_id: Some(ids[0]),
                    after_slot_id: Some(ids[2]),
                },
            )
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidOrderBounds(_)));

        // "After A, before C" is where B already sits.
        let unchanged = service
            .move_slot(
                event_id,
                MoveSlot {
                    slot_id: ids[1],
                    before_slot_id: Some(ids[2]),
                    after_slot_id: Some(ids[0]),
                },
            )
            .unwrap();
        assert_eq!(unchanged.time_slots.iter().map(|s| s.id).collect::<Vec<_>>(), ids);
    }

    #[test]
    fn missing_event_surfaces_repository_error() {
        let (service, _bus, _) = setup();
        let missing = EventId::new();
        let err = service.set_now_playing(missing, 0).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Repository(RepositoryError::EventNotFound(id)) if id == missing
        ));
    }

    #[test]
    fn publish_failure_does_not_fail_the_command() {
        let (service, bus, event_id) = setup();
        bus.shutdown();

        let snapshot = service.set_marker(event_id, 0, "9:00").unwrap();

        assert_eq!(snapshot.time_markers.len(), 1);
        assert_eq!(service.get_event(event_id).unwrap(), snapshot);
    }

    #[test]
    fn update_slot_applies_both_edits() {
        let (service, _bus, event_id) = setup();
        let snapshot = service.add_performer(event_id, performer("Ada"), 1).unwrap();
        let slot_id = snapshot.time_slots[0].id;

        let snapshot = service
            .update_slot(event_id, slot_id, Some(3), Some(Some("Ada Trio".to_string())))
            .unwrap();

        assert_eq!(snapshot.time_slots[0].song_count, 3);
        assert_eq!(snapshot.time_slots[0].display_name, "Ada Trio");

        let unchanged = service.update_slot(event_id, slot_id, None, None).unwrap();
        assert_eq!(unchanged, snapshot);
    }

    #[test]
    fn create_event_rejects_invalid_details() {
        let (service, _bus, _) = setup();
        let mut details = details_at(start(), OPEN_MIC);
        details.end_time = details.start_time - Duration::hours(1);
        assert!(matches!(
            service.create_event(details),
            Err(DispatchError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn update_event_publishes_new_header() {
        let (service, bus, event_id) = setup();
        let mut sub = bus.subscribe().unwrap();
        let later = start() + Duration::hours(1);

        let snapshot = service
            .update_event(event_id, details_at(later, "SHOWCASE"))
            .unwrap();

        assert_eq!(snapshot.event_type, "SHOWCASE");
        assert_eq!(sub.recv().await.unwrap().start_time, later.to_rfc2822());
    }

    #[test]
    fn upcoming_and_current_queries() {
        let bus = Arc::new(InMemoryChangeBus::new());
        let service: Service = ScheduleService::new(InMemoryEventRepository::new(), bus);
        let now = start();

        let old = service
            .create_event(details_at(now - Duration::hours(30), OPEN_MIC))
            .unwrap();
        let showcase = service
            .create_event(details_at(now + Duration::hours(2), "SHOWCASE"))
            .unwrap();
        let tonight = service
            .create_event(details_at(now + Duration::hours(4), OPEN_MIC))
            .unwrap();
        let next_week = service
            .create_event(details_at(now + Duration::days(7), OPEN_MIC))
            .unwrap();

        let upcoming: Vec<EventId> = service
            .upcoming_events(now)
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(upcoming, vec![showcase.id, tonight.id, next_week.id]);
        assert!(!upcoming.contains(&old.id));

        let current = service.current_event(now).unwrap().unwrap();
        assert_eq!(current.id, tonight.id);
        assert!(service.current_event(now + Duration::days(30)).unwrap().is_none());
    }

    #[test]
    fn delete_event_then_load_fails() {
        let (service, _bus, event_id) = setup();
        service.delete_event(event_id).unwrap();
        assert!(matches!(
            service.get_event(event_id),
            Err(DispatchError::Repository(RepositoryError::EventNotFound(_)))
        ));
    }
}
