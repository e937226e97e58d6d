//! Event storage collaborator.
//!
//! The repository persists an event header plus one row per slot and marker.
//! Aggregate changes are written through [`EventRepository::commit`], which
//! applies the whole batch or nothing. Commands go through
//! [`EventRepository::transact`], which also holds the read that the decision
//! was based on inside the same transaction.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::debug;

use lineup_core::{Aggregate, EventId, MarkerId, SlotId, SortKey};
use lineup_schedule::{Event, EventDetails, Performer, ScheduleChange, TimeMarker, TimeSlot};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("event not found: {0}")]
    EventNotFound(EventId),

    #[error("event already exists: {0}")]
    AlreadyExists(EventId),

    #[error("storage failure: {0}")]
    Storage(String),
}

/// Persistence for events and their lineup rows.
///
/// Implementations must be `Send + Sync`; request handlers share one instance.
pub trait EventRepository: Send + Sync {
    fn load_event(&self, event_id: EventId) -> Result<Event, RepositoryError>;

    /// Every stored event, ordered by start time.
    fn list_events(&self) -> Result<Vec<Event>, RepositoryError>;

    fn create_event(&self, event: &Event) -> Result<(), RepositoryError>;

    /// Replace the header and return the event as now stored.
    fn update_event(
        &self,
        event_id: EventId,
        details: &EventDetails,
    ) -> Result<Event, RepositoryError>;

    fn delete_event(&self, event_id: EventId) -> Result<(), RepositoryError>;

    /// Persist all changes of one command atomically.
    fn commit(&self, event_id: EventId, changes: &[ScheduleChange]) -> Result<(), RepositoryError>;

    /// Load, decide and commit as one transaction.
    ///
    /// `decide` sees the latest committed state and no other write to the same
    /// event can interleave before its changes are stored. Returns the event
    /// with the changes applied, plus the changes themselves (empty when
    /// nothing was written).
    fn transact<F, E>(&self, event_id: EventId, decide: F) -> Result<(Event, Vec<ScheduleChange>), E>
    where
        F: FnOnce(&Event) -> Result<Vec<ScheduleChange>, E>,
        E: From<RepositoryError>;
}

impl<R> EventRepository for Arc<R>
where
    R: EventRepository + ?Sized,
{
    fn load_event(&self, event_id: EventId) -> Result<Event, RepositoryError> {
        (**self).load_event(event_id)
    }

    fn list_events(&self) -> Result<Vec<Event>, RepositoryError> {
        (**self).list_events()
    }

    fn create_event(&self, event: &Event) -> Result<(), RepositoryError> {
        (**self).create_event(event)
    }

    fn update_event(
        &self,
        event_id: EventId,
        details: &EventDetails,
    ) -> Result<Event, RepositoryError> {
        (**self).update_event(event_id, details)
    }

    fn delete_event(&self, event_id: EventId) -> Result<(), RepositoryError> {
        (**self).delete_event(event_id)
    }

    fn commit(&self, event_id: EventId, changes: &[ScheduleChange]) -> Result<(), RepositoryError> {
        (**self).commit(event_id, changes)
    }

    fn transact<F, E>(&self, event_id: EventId, decide: F) -> Result<(Event, Vec<ScheduleChange>), E>
    where
        F: FnOnce(&Event) -> Result<Vec<ScheduleChange>, E>,
        E: From<RepositoryError>,
    {
        (**self).transact(event_id, decide)
    }
}

/// Stored slot row.
#[derive(Debug, Clone)]
struct SlotRow {
    sort_key: SortKey,
    name_override: Option<String>,
    performer: Performer,
    unit_count: u32,
}

#[derive(Debug, Clone)]
struct EventRecord {
    details: EventDetails,
    slots: HashMap<SlotId, SlotRow>,
    markers: HashMap<MarkerId, TimeMarker>,
}

impl EventRecord {
    fn from_event(event: &Event) -> Self {
        let slots = event
            .slots()
            .iter()
            .map(|s| (s.id_typed(), SlotRow::from_slot(s)))
            .collect();
        let markers = event
            .markers()
            .iter()
            .map(|m| (m.id_typed(), m.clone()))
            .collect();
        Self {
            details: event.details().clone(),
            slots,
            markers,
        }
    }

    fn to_event(&self, event_id: EventId) -> Event {
        let slots = self
            .slots
            .iter()
            .map(|(id, row)| {
                TimeSlot::restore(
                    *id,
                    event_id,
                    row.sort_key.clone(),
                    row.name_override.clone(),
                    row.performer.clone(),
                    row.unit_count,
                )
            })
            .collect();
        let markers = self.markers.values().cloned().collect();
        Event::restore(event_id, self.details.clone(), slots, markers)
    }

    fn insert_slot(&mut self, slot: &TimeSlot) -> Result<(), RepositoryError> {
        if self.slots.contains_key(&slot.id_typed()) {
            return Err(RepositoryError::Storage(format!(
                "duplicate slot row {}",
                slot.id_typed()
            )));
        }
        self.slots.insert(slot.id_typed(), SlotRow::from_slot(slot));
        Ok(())
    }

    fn save_slot_position(&mut self, slot_id: SlotId, sort_key: &SortKey) {
        self.save_slot(slot_id, |row| row.sort_key = sort_key.clone());
    }

    /// Update a slot row in place; a missing row (deleted concurrently) affects nothing.
    fn save_slot(&mut self, slot_id: SlotId, edit: impl FnOnce(&mut SlotRow)) {
        match self.slots.get_mut(&slot_id) {
            Some(row) => edit(row),
            None => debug!(slot_id = %slot_id, "slot row missing; update skipped"),
        }
    }

    fn delete_slot(&mut self, slot_id: SlotId) {
        self.slots.remove(&slot_id);
    }

    fn save_marker(&mut self, marker: &TimeMarker) {
        self.markers.insert(marker.id_typed(), marker.clone());
    }

    fn delete_marker(&mut self, marker_id: MarkerId) {
        self.markers.remove(&marker_id);
    }

    /// Apply a batch to a copy and swap it in only if every write succeeded.
    fn write_all(&mut self, changes: &[ScheduleChange]) -> Result<(), RepositoryError> {
        let mut staged = self.clone();
        for change in changes {
            staged.write(change)?;
        }
        *self = staged;
        Ok(())
    }

    fn write(&mut self, change: &ScheduleChange) -> Result<(), RepositoryError> {
        match change {
            ScheduleChange::SlotAdded(slot) => self.insert_slot(slot)?,
            ScheduleChange::SlotRemoved { slot_id } => self.delete_slot(*slot_id),
            ScheduleChange::SlotRepositioned { slot_id, sort_key } => {
                self.save_slot_position(*slot_id, sort_key)
            }
            ScheduleChange::SlotUnitsChanged {
                slot_id,
                unit_count,
            } => self.save_slot(*slot_id, |row| row.unit_count = *unit_count),
            ScheduleChange::SlotRenamed {
                slot_id,
                name_override,
            } => self.save_slot(*slot_id, |row| row.name_override = name_override.clone()),
            ScheduleChange::MarkerSaved(marker) => self.save_marker(marker),
            ScheduleChange::MarkerDeleted { marker_id } => self.delete_marker(*marker_id),
        }
        Ok(())
    }
}

impl SlotRow {
    fn from_slot(slot: &TimeSlot) -> Self {
        Self {
            sort_key: slot.sort_key().clone(),
            name_override: slot.name_override().map(str::to_string),
            performer: slot.performer().clone(),
            unit_count: slot.unit_count(),
        }
    }
}

/// In-memory repository.
///
/// Intended for tests/dev. A commit runs against a copy of the event's rows
/// under the write lock and replaces them only if every write succeeded.
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    events: RwLock<HashMap<EventId, EventRecord>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned<T>(_: T) -> RepositoryError {
        RepositoryError::Storage("lock poisoned".to_string())
    }
}

impl EventRepository for InMemoryEventRepository {
    fn load_event(&self, event_id: EventId) -> Result<Event, RepositoryError> {
        let events = self.events.read().map_err(Self::poisoned)?;
        events
            .get(&event_id)
            .map(|record| record.to_event(event_id))
            .ok_or(RepositoryError::EventNotFound(event_id))
    }

    fn list_events(&self) -> Result<Vec<Event>, RepositoryError> {
        let events = self.events.read().map_err(Self::poisoned)?;
        let mut all: Vec<Event> = events
            .iter()
            .map(|(id, record)| record.to_event(*id))
            .collect();
        all.sort_by_key(|e| (e.start_time(), *e.id_typed().as_uuid()));
        Ok(all)
    }

    fn create_event(&self, event: &Event) -> Result<(), RepositoryError> {
        let mut events = self.events.write().map_err(Self::poisoned)?;
        let id = event.id_typed();
        if events.contains_key(&id) {
            return Err(RepositoryError::AlreadyExists(id));
        }
        events.insert(id, EventRecord::from_event(event));
        Ok(())
    }

    fn update_event(
        &self,
        event_id: EventId,
        details: &EventDetails,
    ) -> Result<Event, RepositoryError> {
        let mut events = self.events.write().map_err(Self::poisoned)?;
        let record = events
            .get_mut(&event_id)
            .ok_or(RepositoryError::EventNotFound(event_id))?;
        record.details = details.clone();
        Ok(record.to_event(event_id))
    }

    fn delete_event(&self, event_id: EventId) -> Result<(), RepositoryError> {
        let mut events = self.events.write().map_err(Self::poisoned)?;
        events
            .remove(&event_id)
            .map(|_| ())
            .ok_or(RepositoryError::EventNotFound(event_id))
    }

    fn commit(&self, event_id: EventId, changes: &[ScheduleChange]) -> Result<(), RepositoryError> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut events = self.events.write().map_err(Self::poisoned)?;
        events
            .get_mut(&event_id)
            .ok_or(RepositoryError::EventNotFound(event_id))?
            .write_all(changes)
    }

    fn transact<F, E>(&self, event_id: EventId, decide: F) -> Result<(Event, Vec<ScheduleChange>), E>
    where
        F: FnOnce(&Event) -> Result<Vec<ScheduleChange>, E>,
        E: From<RepositoryError>,
    {
        let mut events = self.events.write().map_err(Self::poisoned)?;
        let record = events
            .get_mut(&event_id)
            .ok_or(RepositoryError::EventNotFound(event_id))?;

        let mut event = record.to_event(event_id);
        let changes = decide(&event)?;
        if changes.is_empty() {
            return Ok((event, changes));
        }

        record.write_all(&changes)?;
        for change in &changes {
            event.apply(change);
        }
        Ok((event, changes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use lineup_core::PerformerId;
    use lineup_schedule::{AddSlot, MoveSlot, OPEN_MIC, ScheduleCommand, SetNowPlaying};

    fn details(hour: u32) -> EventDetails {
        let start_time = Utc.with_ymd_and_hms(2024, 5, 3, hour, 0, 0).unwrap();
        EventDetails {
            start_time,
            end_time: start_time + Duration::hours(2),
            event_type: OPEN_MIC.to_string(),
        }
    }

    fn stored_event(repo: &InMemoryEventRepository) -> Event {
        let event = Event::new(EventId::new(), details(20));
        repo.create_event(&event).unwrap();
        event
    }

    fn add_slot(event: &Event, name: &str) -> Vec<ScheduleChange> {
        event
            .handle(&ScheduleCommand::AddSlot(AddSlot {
                slot_id: SlotId::new(),
                performer: Performer::new(PerformerId::new(), name),
                unit_count: 1,
            }))
            .unwrap()
    }

    #[test]
    fn committed_changes_are_visible_on_load() {
        let repo = InMemoryEventRepository::new();
        let mut event = stored_event(&repo);

        for name in ["Ada", "Bo"] {
            let changes = add_slot(&event, name);
            repo.commit(event.id_typed(), &changes).unwrap();
            changes.iter().for_each(|c| event.apply(c));
        }
        let playing = event
            .execute(&ScheduleCommand::SetNowPlaying(SetNowPlaying {
                marker_id: MarkerId::new(),
                slot_index: 1,
            }))
            .unwrap();
        repo.commit(event.id_typed(), &playing).unwrap();

        let loaded = repo.load_event(event.id_typed()).unwrap();
        assert_eq!(loaded, event);
    }

    #[test]
    fn reposition_writes_only_the_sort_key() {
        let repo = InMemoryEventRepository::new();
        let mut event = stored_event(&repo);
        for name in ["A", "B"] {
            let changes = add_slot(&event, name);
            repo.commit(event.id_typed(), &changes).unwrap();
            changes.iter().for_each(|c| event.apply(c));
        }
        let (a, b) = (event.slots()[0].id_typed(), event.slots()[1].id_typed());

        let moved = event
            .execute(&ScheduleCommand::MoveSlot(MoveSlot {
                slot_id: a,
                before_slot_id: None,
                after_slot_id: Some(b),
            }))
            .unwrap();
        repo.commit(event.id_typed(), &moved).unwrap();

        let loaded = repo.load_event(event.id_typed()).unwrap();
        let order: Vec<SlotId> = loaded.slots().iter().map(|s| s.id_typed()).collect();
        assert_eq!(order, vec![b, a]);
        assert_eq!(loaded.slot(b).unwrap().sort_key().as_str(), "a1");
    }

    #[test]
    fn failed_commit_leaves_rows_untouched() {
        let repo = InMemoryEventRepository::new();
        let event = stored_event(&repo);
        let first = add_slot(&event, "Ada");
        repo.commit(event.id_typed(), &first).unwrap();

        // Second write in the batch collides with an existing row.
        let mut batch = add_slot(&event, "Bo");
        batch.extend(first.clone());
        let err = repo.commit(event.id_typed(), &batch).unwrap_err();

        assert!(matches!(err, RepositoryError::Storage(_)));
        assert_eq!(repo.load_event(event.id_typed()).unwrap().slots().len(), 1);
    }

    #[test]
    fn transact_decides_on_current_rows_and_commits() {
        let repo = InMemoryEventRepository::new();
        let stale = stored_event(&repo);
        let id = stale.id_typed();
        repo.commit(id, &add_slot(&stale, "Ada")).unwrap();

        let (event, changes) = repo
            .transact(id, |current| {
                assert_eq!(current.slots().len(), 1);
                current
                    .handle(&ScheduleCommand::AddSlot(AddSlot {
                        slot_id: SlotId::new(),
                        performer: Performer::new(PerformerId::new(), "Bo"),
                        unit_count: 1,
                    }))
                    .map_err(|_| Rejected::Decision)
            })
            .unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(event.slots().len(), 2);
        assert!(event.slots()[0].sort_key() < event.slots()[1].sort_key());
        assert_eq!(repo.load_event(id).unwrap(), event);
    }

    #[derive(Debug, PartialEq)]
    enum Rejected {
        Decision,
        Repository(RepositoryError),
    }

    impl From<RepositoryError> for Rejected {
        fn from(value: RepositoryError) -> Self {
            Rejected::Repository(value)
        }
    }

    #[test]
    fn rejected_decision_writes_nothing() {
        let repo = InMemoryEventRepository::new();
        let event = stored_event(&repo);
        let id = event.id_typed();

        let err = repo
            .transact(id, |_| Err::<Vec<ScheduleChange>, _>(Rejected::Decision))
            .unwrap_err();

        assert_eq!(err, Rejected::Decision);
        assert_eq!(repo.load_event(id).unwrap(), event);
    }

    #[test]
    fn transact_on_missing_event_never_decides() {
        let repo = InMemoryEventRepository::new();
        let missing = EventId::new();

        let err = repo
            .transact(missing, |_| -> Result<Vec<ScheduleChange>, Rejected> {
                panic!("decided without an event")
            })
            .unwrap_err();

        assert_eq!(err, Rejected::Repository(RepositoryError::EventNotFound(missing)));
    }

    #[test]
    fn commit_to_missing_event_fails() {
        let repo = InMemoryEventRepository::new();
        let event = Event::new(EventId::new(), details(20));
        let err = repo.commit(event.id_typed(), &add_slot(&event, "Ada")).unwrap_err();
        assert_eq!(err, RepositoryError::EventNotFound(event.id_typed()));
    }

    #[test]
    fn event_lifecycle() {
        let repo = InMemoryEventRepository::new();
        let event = stored_event(&repo);
        let id = event.id_typed();

        assert_eq!(repo.create_event(&event), Err(RepositoryError::AlreadyExists(id)));

        repo.update_event(id, &details(22)).unwrap();
        assert_eq!(repo.load_event(id).unwrap().details(), &details(22));

        repo.delete_event(id).unwrap();
        assert_eq!(repo.load_event(id).unwrap_err(), RepositoryError::EventNotFound(id));
        assert_eq!(repo.delete_event(id), Err(RepositoryError::EventNotFound(id)));
    }

    #[test]
    fn list_events_orders_by_start_time() {
        let repo = InMemoryEventRepository::new();
        let late = Event::new(EventId::new(), details(22));
        let early = Event::new(EventId::new(), details(18));
        repo.create_event(&late).unwrap();
        repo.create_event(&early).unwrap();

        let ids: Vec<EventId> = repo
            .list_events()
            .unwrap()
            .iter()
            .map(|e| e.id_typed())
            .collect();
        assert_eq!(ids, vec![early.id_typed(), late.id_typed()]);
    }
}
