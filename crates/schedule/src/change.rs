use serde::{Deserialize, Serialize};

use lineup_core::{MarkerId, SlotId, SortKey};
use lineup_events::Change;

use crate::marker::TimeMarker;
use crate::slot::TimeSlot;

/// State changes produced by [`crate::Event`] and committed by the repository.
///
/// Each variant maps onto exactly one row write, so a command's changes can be
/// persisted as one atomic batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleChange {
    SlotAdded(TimeSlot),
    SlotRemoved { slot_id: SlotId },
    SlotRepositioned { slot_id: SlotId, sort_key: SortKey },
    SlotUnitsChanged { slot_id: SlotId, unit_count: u32 },
    SlotRenamed { slot_id: SlotId, name_override: Option<String> },
    MarkerSaved(TimeMarker),
    MarkerDeleted { marker_id: MarkerId },
}

impl Change for ScheduleChange {
    fn change_type(&self) -> &'static str {
        match self {
            ScheduleChange::SlotAdded(_) => "lineup.slot.added",
            ScheduleChange::SlotRemoved { .. } => "lineup.slot.removed",
            ScheduleChange::SlotRepositioned { .. } => "lineup.slot.repositioned",
            ScheduleChange::SlotUnitsChanged { .. } => "lineup.slot.units_changed",
            ScheduleChange::SlotRenamed { .. } => "lineup.slot.renamed",
            ScheduleChange::MarkerSaved(_) => "lineup.marker.saved",
            ScheduleChange::MarkerDeleted { .. } => "lineup.marker.deleted",
        }
    }
}
