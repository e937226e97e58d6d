use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lineup_core::{
    Aggregate, AggregateRoot, DomainError, DomainResult, EventId, MarkerId, SlotId, find_by_id,
    key_between, position_by_id,
};

use crate::change::ScheduleChange;
use crate::command::{
    AddSlot, DeleteMarker, MoveSlot, RemovePerformer, RenameSlot, ScheduleCommand, SetMarker,
    SetNowPlaying, SetUnitCount,
};
use crate::marker::{MarkerType, NOW_PLAYING_DISPLAY, TimeMarker};
use crate::slot::{Performer, TimeSlot};
use crate::snapshot::EventSnapshot;

/// Event type of the weekly open mic; the only type with a "current" event.
pub const OPEN_MIC: &str = "OPEN_MIC";

/// Editable event header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub event_type: String,
}

impl EventDetails {
    pub fn validate(&self) -> DomainResult<()> {
        if self.event_type.trim().is_empty() {
            return Err(DomainError::validation("event_type cannot be empty"));
        }
        if self.end_time < self.start_time {
            return Err(DomainError::validation("end_time cannot precede start_time"));
        }
        Ok(())
    }
}

/// Aggregate root: Event.
///
/// Owns the ordered lineup (slots sorted by sort key, ties broken by slot id)
/// and the markers pinned to slot positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    id: EventId,
    details: EventDetails,
    slots: Vec<TimeSlot>,
    markers: Vec<TimeMarker>,
}

impl Event {
    /// A new event with an empty lineup.
    pub fn new(id: EventId, details: EventDetails) -> Self {
        Self {
            id,
            details,
            slots: Vec::new(),
            markers: Vec::new(),
        }
    }

    /// Rebuild an event from stored rows, in any order.
    pub fn restore(
        id: EventId,
        details: EventDetails,
        slots: Vec<TimeSlot>,
        markers: Vec<TimeMarker>,
    ) -> Self {
        let mut event = Self {
            id,
            details,
            slots,
            markers,
        };
        event.sort_slots();
        event
    }

    pub fn id_typed(&self) -> EventId {
        *self.id()
    }

    pub fn details(&self) -> &EventDetails {
        &self.details
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.details.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.details.end_time
    }

    pub fn event_type(&self) -> &str {
        &self.details.event_type
    }

    /// Slots in lineup order.
    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn markers(&self) -> &[TimeMarker] {
        &self.markers
    }

    pub fn slot(&self, slot_id: SlotId) -> Option<&TimeSlot> {
        find_by_id(&self.slots, &slot_id)
    }

    /// Slot immediately before `slot_id` in the lineup.
    pub fn previous_slot(&self, slot_id: SlotId) -> Option<&TimeSlot> {
        let position = self.slot_position(slot_id)?;
        position.checked_sub(1).and_then(|i| self.slots.get(i))
    }

    /// Slot immediately after `slot_id` in the lineup.
    pub fn next_slot(&self, slot_id: SlotId) -> Option<&TimeSlot> {
        let position = self.slot_position(slot_id)?;
        self.slots.get(position + 1)
    }

    pub fn marker(&self, marker_id: MarkerId) -> Option<&TimeMarker> {
        find_by_id(&self.markers, &marker_id)
    }

    /// Plain time marker with this display text.
    pub fn marker_by_display(&self, display: &str) -> Option<&TimeMarker> {
        self.markers
            .iter()
            .find(|m| m.kind() == MarkerType::Time && m.display() == display)
    }

    /// A plain time marker at `slot_index` whose display differs from `display`.
    pub fn duplicate_marker_at<'a>(
        &'a self,
        slot_index: u32,
        display: &'a str,
    ) -> Option<&'a TimeMarker> {
        self.time_markers_displaced_by(slot_index, display).next()
    }

    pub fn now_playing(&self) -> Option<&TimeMarker> {
        self.markers.iter().find(|m| m.is_now_playing())
    }

    pub fn snapshot(&self) -> EventSnapshot {
        EventSnapshot::from_event(self)
    }

    fn time_markers_displaced_by<'a>(
        &'a self,
        slot_index: u32,
        display: &'a str,
    ) -> impl Iterator<Item = &'a TimeMarker> + 'a {
        self.markers.iter().filter(move |m| {
            m.kind() == MarkerType::Time && m.slot_index() == slot_index && m.display() != display
        })
    }

    fn slot_position(&self, slot_id: SlotId) -> Option<usize> {
        position_by_id(&self.slots, &slot_id)
    }

    fn slot_mut(&mut self, slot_id: SlotId) -> Option<&mut TimeSlot> {
        self.slots.iter_mut().find(|s| s.id_typed() == slot_id)
    }

    fn sort_slots(&mut self) {
        self.slots.sort_by(|a, b| {
            a.sort_key()
                .cmp(b.sort_key())
                .then_with(|| a.id_typed().as_uuid().cmp(b.id_typed().as_uuid()))
        });
    }
}

impl AggregateRoot for Event {
    type Id = EventId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Aggregate for Event {
    type Command = ScheduleCommand;
    type Change = ScheduleChange;
    type Error = DomainError;

    fn apply(&mut self, change: &Self::Change) {
        match change {
            ScheduleChange::SlotAdded(slot) => {
                self.slots.retain(|s| s.id_typed() != slot.id_typed());
                self.slots.push(slot.clone());
                self.sort_slots();
            }
            ScheduleChange::SlotRemoved { slot_id } => {
                self.slots.retain(|s| s.id_typed() != *slot_id);
            }
            ScheduleChange::SlotRepositioned { slot_id, sort_key } => {
                if let Some(slot) = self.slot_mut(*slot_id) {
                    slot.set_sort_key(sort_key.clone());
                }
                self.sort_slots();
            }
            ScheduleChange::SlotUnitsChanged {
                slot_id,
                unit_count,
            } => {
                if let Some(slot) = self.slot_mut(*slot_id) {
                    slot.set_unit_count(*unit_count);
                }
            }
            ScheduleChange::SlotRenamed {
                slot_id,
                name_override,
            } => {
                if let Some(slot) = self.slot_mut(*slot_id) {
                    slot.set_name_override(name_override.clone());
                }
            }
            ScheduleChange::MarkerSaved(marker) => {
                match self
                    .markers
                    .iter_mut()
                    .find(|m| m.id_typed() == marker.id_typed())
                {
                    Some(existing) => *existing = marker.clone(),
                    None => self.markers.push(marker.clone()),
                }
            }
            ScheduleChange::MarkerDeleted { marker_id } => {
                self.markers.retain(|m| m.id_typed() != *marker_id);
            }
        }
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Change>, Self::Error> {
        match command {
            ScheduleCommand::AddSlot(cmd) => self.handle_add_slot(cmd),
            ScheduleCommand::RemovePerformer(cmd) => self.handle_remove_performer(cmd),
            ScheduleCommand::MoveSlot(cmd) => self.handle_move_slot(cmd),
            ScheduleCommand::SetUnitCount(cmd) => self.handle_set_unit_count(cmd),
            ScheduleCommand::RenameSlot(cmd) => self.handle_rename_slot(cmd),
            ScheduleCommand::SetMarker(cmd) => self.handle_set_marker(cmd),
            ScheduleCommand::DeleteMarker(cmd) => self.handle_delete_marker(cmd),
            ScheduleCommand::SetNowPlaying(cmd) => self.handle_set_now_playing(cmd),
        }
    }
}

impl Event {
    fn ensure_unit_count(unit_count: u32) -> DomainResult<()> {
        if unit_count == 0 {
            return Err(DomainError::validation("unit_count must be at least 1"));
        }
        Ok(())
    }

    fn handle_add_slot(&self, cmd: &AddSlot) -> DomainResult<Vec<ScheduleChange>> {
        Self::ensure_unit_count(cmd.unit_count)?;
        let name = cmd.performer.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("performer name cannot be empty"));
        }
        if self.slot(cmd.slot_id).is_some() {
            return Err(DomainError::validation(format!(
                "slot {} already exists",
                cmd.slot_id
            )));
        }

        let sort_key = key_between(self.slots.last().map(TimeSlot::sort_key), None)?;

        Ok(vec![ScheduleChange::SlotAdded(TimeSlot::new(
            cmd.slot_id,
            self.id,
            sort_key,
            Performer::new(cmd.performer.id, name),
            cmd.unit_count,
        ))])
    }

    fn handle_remove_performer(&self, cmd: &RemovePerformer) -> DomainResult<Vec<ScheduleChange>> {
        Ok(self
            .slots
            .iter()
            .filter(|s| s.performer().id == cmd.performer_id)
            .map(|s| ScheduleChange::SlotRemoved {
                slot_id: s.id_typed(),
            })
            .collect())
    }

    fn handle_move_slot(&self, cmd: &MoveSlot) -> DomainResult<Vec<ScheduleChange>> {
        if cmd.before_slot_id.is_none() && cmd.after_slot_id.is_none() {
            return Err(DomainError::validation(
                "move requires a before or after slot",
            ));
        }
        let Some(moving) = self.slot(cmd.slot_id) else {
            return Ok(Vec::new());
        };
        if cmd.before_slot_id == Some(cmd.slot_id) || cmd.after_slot_id == Some(cmd.slot_id) {
            return Ok(Vec::new());
        }

        // Neighbours are resolved as if the moving slot were already lifted out.
        let others: Vec<&TimeSlot> = self
            .slots
            .iter()
            .filter(|s| s.id_typed() != cmd.slot_id)
            .collect();
        let position = |id: SlotId| position_by_id(&others, &id);

        let (lower, upper) = match (cmd.after_slot_id, cmd.before_slot_id) {
            (Some(after), Some(before)) => {
                let (Some(a), Some(b)) = (position(after), position(before)) else {
                    return Ok(Vec::new());
                };
                if b != a + 1 {
                    return Err(DomainError::invalid_bounds(format!(
                        "slots {after} and {before} are not adjacent"
                    )));
                }
                (Some(others[a]), Some(others[b]))
            }
            (Some(after), None) => {
                let Some(a) = position(after) else {
                    return Ok(Vec::new());
                };
                (Some(others[a]), others.get(a + 1).copied())
            }
            (None, Some(before)) => {
                let Some(b) = position(before) else {
                    return Ok(Vec::new());
                };
                (b.checked_sub(1).map(|i| others[i]), Some(others[b]))
            }
            (None, None) => return Ok(Vec::new()),
        };

        let in_place = lower.is_none_or(|l| l.sort_key() < moving.sort_key())
            && upper.is_none_or(|u| moving.sort_key() < u.sort_key());
        if in_place {
            return Ok(Vec::new());
        }

        let sort_key = key_between(
            lower.map(|s| s.sort_key()),
            upper.map(|s| s.sort_key()),
        )?;

        Ok(vec![ScheduleChange::SlotRepositioned {
            slot_id: cmd.slot_id,
            sort_key,
        }])
    }

    fn handle_set_unit_count(&self, cmd: &SetUnitCount) -> DomainResult<Vec<ScheduleChange>> {
        Self::ensure_unit_count(cmd.unit_count)?;
        match self.slot(cmd.slot_id) {
            Some(slot) if slot.unit_count() != cmd.unit_count => {
                Ok(vec![ScheduleChange::SlotUnitsChanged {
                    slot_id: cmd.slot_id,
                    unit_count: cmd.unit_count,
                }])
            }
            _ => Ok(Vec::new()),
        }
    }

    fn handle_rename_slot(&self, cmd: &RenameSlot) -> DomainResult<Vec<ScheduleChange>> {
        let name_override = cmd
            .name_override
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        match self.slot(cmd.slot_id) {
            Some(slot) if slot.name_override() != name_override.as_deref() => {
                Ok(vec![ScheduleChange::SlotRenamed {
                    slot_id: cmd.slot_id,
                    name_override,
                }])
            }
            _ => Ok(Vec::new()),
        }
    }

    fn handle_set_marker(&self, cmd: &SetMarker) -> DomainResult<Vec<ScheduleChange>> {
        let display = cmd.display.trim();
        if display.is_empty() {
            return Err(DomainError::validation("marker display cannot be empty"));
        }

        let mut changes = Vec::new();
        match self.marker_by_display(display) {
            Some(existing) if existing.slot_index() == cmd.slot_index => {}
            Some(existing) => {
                changes.push(ScheduleChange::MarkerSaved(existing.relocated(cmd.slot_index)));
            }
            None => {
                if self.marker(cmd.marker_id).is_some() {
                    return Err(DomainError::validation(format!(
                        "marker {} already exists",
                        cmd.marker_id
                    )));
                }
                changes.push(ScheduleChange::MarkerSaved(TimeMarker::new(
                    cmd.marker_id,
                    cmd.slot_index,
                    MarkerType::Time,
                    display,
                )));
            }
        }

        // One time label per position.
        changes.extend(
            self.time_markers_displaced_by(cmd.slot_index, display)
                .map(|m| ScheduleChange::MarkerDeleted {
                    marker_id: m.id_typed(),
                }),
        );

        Ok(changes)
    }

    fn handle_delete_marker(&self, cmd: &DeleteMarker) -> DomainResult<Vec<ScheduleChange>> {
        Ok(self
            .marker(cmd.marker_id)
            .map(|m| ScheduleChange::MarkerDeleted {
                marker_id: m.id_typed(),
            })
            .into_iter()
            .collect())
    }

    fn handle_set_now_playing(&self, cmd: &SetNowPlaying) -> DomainResult<Vec<ScheduleChange>> {
        match self.now_playing() {
            Some(current) if current.slot_index() == cmd.slot_index => Ok(Vec::new()),
            Some(current) => Ok(vec![ScheduleChange::MarkerSaved(
                current.relocated(cmd.slot_index),
            )]),
            None => {
                if self.marker(cmd.marker_id).is_some() {
                    return Err(DomainError::validation(format!(
                        "marker {} already exists",
                        cmd.marker_id
                    )));
                }
                Ok(vec![ScheduleChange::MarkerSaved(TimeMarker::new(
                    cmd.marker_id,
                    cmd.slot_index,
                    MarkerType::Playing,
                    NOW_PLAYING_DISPLAY,
                ))])
            }
        }
    }
}
