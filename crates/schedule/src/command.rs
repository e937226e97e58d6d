use serde::{Deserialize, Serialize};

use lineup_core::{MarkerId, PerformerId, SlotId};

use crate::slot::Performer;

/// Append a performer at the end of the lineup.
///
/// The caller supplies `slot_id` so that handling stays deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddSlot {
    pub slot_id: SlotId,
    pub performer: Performer,
    pub unit_count: u32,
}

/// Remove every slot booked for a performer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovePerformer {
    pub performer_id: PerformerId,
}

/// Reposition a slot relative to its new neighbours.
///
/// - `after_slot_id`: the slot lands immediately after this one
/// - `before_slot_id`: the slot lands immediately before this one
///
/// At least one anchor is required; when both are given they must be adjacent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSlot {
    pub slot_id: SlotId,
    pub before_slot_id: Option<SlotId>,
    pub after_slot_id: Option<SlotId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetUnitCount {
    pub slot_id: SlotId,
    pub unit_count: u32,
}

/// Set (or clear, with `None`/blank) a slot's display name override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameSlot {
    pub slot_id: SlotId,
    pub name_override: Option<String>,
}

/// Pin a time label at a slot position.
///
/// `marker_id` is only used when no marker with this display exists yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetMarker {
    pub marker_id: MarkerId,
    pub slot_index: u32,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteMarker {
    pub marker_id: MarkerId,
}

/// Point the now-playing marker at a slot position, creating it with
/// `marker_id` if the event has none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetNowPlaying {
    pub marker_id: MarkerId,
    pub slot_index: u32,
}

/// Commands accepted by [`crate::Event`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleCommand {
    AddSlot(AddSlot),
    RemovePerformer(RemovePerformer),
    MoveSlot(MoveSlot),
    SetUnitCount(SetUnitCount),
    RenameSlot(RenameSlot),
    SetMarker(SetMarker),
    DeleteMarker(DeleteMarker),
    SetNowPlaying(SetNowPlaying),
}

impl ScheduleCommand {
    /// Stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            ScheduleCommand::AddSlot(_) => "add_slot",
            ScheduleCommand::RemovePerformer(_) => "remove_performer",
            ScheduleCommand::MoveSlot(_) => "move_slot",
            ScheduleCommand::SetUnitCount(_) => "set_unit_count",
            ScheduleCommand::RenameSlot(_) => "rename_slot",
            ScheduleCommand::SetMarker(_) => "set_marker",
            ScheduleCommand::DeleteMarker(_) => "delete_marker",
            ScheduleCommand::SetNowPlaying(_) => "set_now_playing",
        }
    }
}
