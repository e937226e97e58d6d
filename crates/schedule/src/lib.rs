//! Lineup schedule domain: the event aggregate with its ordered time slots and markers.

pub mod change;
pub mod command;
pub mod display_time;
pub mod event;
pub mod marker;
pub mod slot;
pub mod snapshot;

pub use change::ScheduleChange;
pub use command::{
    AddSlot, DeleteMarker, MoveSlot, RemovePerformer, RenameSlot, ScheduleCommand, SetMarker,
    SetNowPlaying, SetUnitCount,
};
pub use event::{Event, EventDetails, OPEN_MIC};
pub use marker::{MarkerType, NOW_PLAYING_DISPLAY, TimeMarker};
pub use slot::{Performer, TimeSlot};
pub use snapshot::{EventSnapshot, MarkerSnapshot, SlotSnapshot};
