use core::str::FromStr;

use serde::{Deserialize, Serialize};

use lineup_core::{DomainError, Entity, MarkerId};

/// Display text given to a freshly created now-playing marker.
pub const NOW_PLAYING_DISPLAY: &str = "Playing";

/// Kind of marker.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarkerType {
    /// Plain time label (e.g. "9:15") pinned to a slot position.
    Time,
    /// The single "now playing" pointer.
    Playing,
}

impl MarkerType {
    pub fn as_str(self) -> &'static str {
        match self {
            MarkerType::Time => "TIME",
            MarkerType::Playing => "PLAYING",
        }
    }
}

impl core::fmt::Display for MarkerType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarkerType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TIME" => Ok(MarkerType::Time),
            "PLAYING" => Ok(MarkerType::Playing),
            other => Err(DomainError::validation(format!("unknown marker type '{other}'"))),
        }
    }
}

/// Annotation pinned to a slot position (an index, not a slot id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeMarker {
    id: MarkerId,
    slot_index: u32,
    kind: MarkerType,
    display: String,
}

impl TimeMarker {
    pub(crate) fn new(id: MarkerId, slot_index: u32, kind: MarkerType, display: impl Into<String>) -> Self {
        Self {
            id,
            slot_index,
            kind,
            display: display.into(),
        }
    }

    /// Rebuild a marker from storage.
    pub fn restore(id: MarkerId, slot_index: u32, kind: MarkerType, display: impl Into<String>) -> Self {
        Self::new(id, slot_index, kind, display)
    }

    pub fn id_typed(&self) -> MarkerId {
        self.id
    }

    pub fn slot_index(&self) -> u32 {
        self.slot_index
    }

    pub fn kind(&self) -> MarkerType {
        self.kind
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn is_now_playing(&self) -> bool {
        self.kind == MarkerType::Playing
    }

    /// Same marker at a different position.
    pub(crate) fn relocated(&self, slot_index: u32) -> Self {
        Self {
            slot_index,
            ..self.clone()
        }
    }
}

impl Entity for TimeMarker {
    type Id = MarkerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
