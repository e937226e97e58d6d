//! Wire representation of an event's full schedule.
//!
//! Snapshots are what viewers receive, both on connect and after every change.
//! They always carry the whole lineup, never a diff.

use serde::{Deserialize, Serialize};

use lineup_core::{EventId, MarkerId, SlotId};

use crate::display_time::{arrival_times, format_timestamp};
use crate::event::Event;
use crate::marker::MarkerType;
use crate::slot::Performer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSnapshot {
    pub id: EventId,
    pub start_time: String,
    pub end_time: String,
    pub event_type: String,
    pub time_slots: Vec<SlotSnapshot>,
    pub time_markers: Vec<MarkerSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub id: SlotId,
    pub song_count: u32,
    pub performer: Performer,
    pub display_name: String,
    pub time_display: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerSnapshot {
    pub id: MarkerId,
    pub display: String,
    #[serde(rename = "type")]
    pub kind: MarkerType,
    pub slot_index: u32,
}

impl EventSnapshot {
    pub fn from_event(event: &Event) -> Self {
        let times = arrival_times(event.start_time(), event.slots());

        let time_slots = event
            .slots()
            .iter()
            .zip(times)
            .map(|(slot, at)| SlotSnapshot {
                id: slot.id_typed(),
                song_count: slot.unit_count(),
                performer: slot.performer().clone(),
                display_name: slot.display_name().to_string(),
                time_display: format_timestamp(at),
            })
            .collect();

        let mut time_markers: Vec<MarkerSnapshot> = event
            .markers()
            .iter()
            .map(|m| MarkerSnapshot {
                id: m.id_typed(),
                display: m.display().to_string(),
                kind: m.kind(),
                slot_index: m.slot_index(),
            })
            .collect();
        time_markers.sort_by_key(|m| m.slot_index);

        Self {
            id: event.id_typed(),
            start_time: format_timestamp(event.start_time()),
            end_time: format_timestamp(event.end_time()),
            event_type: event.event_type().to_string(),
            time_slots,
            time_markers,
        }
    }
}
