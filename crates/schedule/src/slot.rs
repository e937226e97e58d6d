use serde::{Deserialize, Serialize};

use lineup_core::{Entity, EventId, PerformerId, SlotId, SortKey, ValueObject};

/// Reference to a performer booked into a slot.
///
/// Performers are managed elsewhere; the lineup only keeps the id and the name
/// to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Performer {
    pub id: PerformerId,
    pub name: String,
}

impl Performer {
    pub fn new(id: PerformerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl ValueObject for Performer {}

/// One performer's place in the lineup.
///
/// Position is the `sort_key`; only the owning [`crate::Event`] changes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    id: SlotId,
    event_id: EventId,
    sort_key: SortKey,
    name_override: Option<String>,
    performer: Performer,
    unit_count: u32,
}

impl TimeSlot {
    pub(crate) fn new(
        id: SlotId,
        event_id: EventId,
        sort_key: SortKey,
        performer: Performer,
        unit_count: u32,
    ) -> Self {
        Self {
            id,
            event_id,
            sort_key,
            name_override: None,
            performer,
            unit_count,
        }
    }

    /// Rebuild a slot from storage.
    pub fn restore(
        id: SlotId,
        event_id: EventId,
        sort_key: SortKey,
        name_override: Option<String>,
        performer: Performer,
        unit_count: u32,
    ) -> Self {
        Self {
            id,
            event_id,
            sort_key,
            name_override,
            performer,
            unit_count,
        }
    }

    pub fn id_typed(&self) -> SlotId {
        self.id
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn sort_key(&self) -> &SortKey {
        &self.sort_key
    }

    pub fn performer(&self) -> &Performer {
        &self.performer
    }

    pub fn name_override(&self) -> Option<&str> {
        self.name_override.as_deref()
    }

    /// Name shown in the lineup: the override if set, else the performer's name.
    pub fn display_name(&self) -> &str {
        self.name_override
            .as_deref()
            .unwrap_or(self.performer.name.as_str())
    }

    pub fn unit_count(&self) -> u32 {
        self.unit_count
    }

    pub(crate) fn set_sort_key(&mut self, sort_key: SortKey) {
        self.sort_key = sort_key;
    }

    pub(crate) fn set_unit_count(&mut self, unit_count: u32) {
        self.unit_count = unit_count;
    }

    pub(crate) fn set_name_override(&mut self, name_override: Option<String>) {
        self.name_override = name_override;
    }
}

impl Entity for TimeSlot {
    type Id = SlotId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
