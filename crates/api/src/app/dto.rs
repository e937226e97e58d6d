use std::str::FromStr;

use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use lineup_core::DomainError;
use lineup_schedule::EventDetails;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

/// Create/update body; timestamps accept RFC 3339 or RFC 2822.
#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub start_time: String,
    pub end_time: String,
    pub event_type: String,
}

#[derive(Debug, Deserialize)]
pub struct AddPerformerRequest {
    pub performer_id: String,
    pub name: String,
    pub song_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SortRequest {
    pub current_slot_id: String,
    pub before_slot_id: Option<String>,
    pub after_slot_id: Option<String>,
}

/// Slot edits. `name_override: null` clears the override; omitting it leaves it alone.
#[derive(Debug, Deserialize)]
pub struct UpdateSlotRequest {
    pub song_count: Option<u32>,
    #[serde(default, deserialize_with = "present")]
    pub name_override: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct MarkerRequest {
    pub slot_index: u32,
    pub time_display: String,
}

#[derive(Debug, Deserialize)]
pub struct NowPlayingRequest {
    pub slot_index: u32,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

// -------------------------
// Parsing helpers
// -------------------------

pub fn parse_id<T>(raw: &str, field: &'static str) -> Result<T, Response>
where
    T: FromStr<Err = DomainError>,
{
    T::from_str(raw.trim()).map_err(|e| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("{field}: {e}"))
    })
}

pub fn parse_optional_id<T>(raw: Option<&str>, field: &'static str) -> Result<Option<T>, Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.map(|r| parse_id(r, field)).transpose()
}

pub fn parse_timestamp(raw: &str, field: &'static str) -> Result<DateTime<Utc>, Response> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_timestamp",
                format!("{field}: {e}"),
            )
        })
}

impl EventRequest {
    pub fn into_details(self) -> Result<EventDetails, Response> {
        Ok(EventDetails {
            start_time: parse_timestamp(&self.start_time, "start_time")?,
            end_time: parse_timestamp(&self.end_time, "end_time")?,
            event_type: self.event_type.trim().to_string(),
        })
    }
}
