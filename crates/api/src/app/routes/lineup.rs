//! Lineup commands. Every handler answers with the event's full snapshot.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    response::Response,
};

use lineup_core::{EventId, MarkerId, PerformerId, SlotId};
use lineup_infra::DispatchError;
use lineup_schedule::{EventSnapshot, MoveSlot, Performer};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

type SnapshotResponse = Result<Json<EventSnapshot>, Response>;

fn respond(result: Result<EventSnapshot, DispatchError>) -> SnapshotResponse {
    result.map(Json).map_err(errors::dispatch_error_to_response)
}

/// POST /events/:id/performers
pub async fn add_performer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::AddPerformerRequest>,
) -> SnapshotResponse {
    let event_id: EventId = dto::parse_id(&id, "event id")?;
    let performer_id: PerformerId = dto::parse_id(&body.performer_id, "performer_id")?;

    respond(services.schedule.add_performer(
        event_id,
        Performer::new(performer_id, body.name),
        body.song_count.unwrap_or(1),
    ))
}

/// DELETE /events/:id/performers/:performer_id
pub async fn remove_performer(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, performer_id)): Path<(String, String)>,
) -> SnapshotResponse {
    let event_id: EventId = dto::parse_id(&id, "event id")?;
    let performer_id: PerformerId = dto::parse_id(&performer_id, "performer id")?;

    respond(services.schedule.remove_performer(event_id, performer_id))
}

/// POST /events/:id/sort
///
/// `after_slot_id` places the slot right after that slot, `before_slot_id`
/// right before it.
pub async fn sort_slot(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::SortRequest>,
) -> SnapshotResponse {
    let event_id: EventId = dto::parse_id(&id, "event id")?;
    let slot_id: SlotId = dto::parse_id(&body.current_slot_id, "current_slot_id")?;
    let before: Option<SlotId> =
        dto::parse_optional_id(body.before_slot_id.as_deref(), "before_slot_id")?;
    let after: Option<SlotId> =
        dto::parse_optional_id(body.after_slot_id.as_deref(), "after_slot_id")?;

    respond(services.schedule.move_slot(
        event_id,
        MoveSlot {
            slot_id,
            before_slot_id: before,
            after_slot_id: after,
        },
    ))
}

/// PUT /events/:id/slots/:slot_id
pub async fn update_slot(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, slot_id)): Path<(String, String)>,
    Json(body): Json<dto::UpdateSlotRequest>,
) -> SnapshotResponse {
    let event_id: EventId = dto::parse_id(&id, "event id")?;
    let slot_id: SlotId = dto::parse_id(&slot_id, "slot id")?;

    respond(
        services
            .schedule
            .update_slot(event_id, slot_id, body.song_count, body.name_override),
    )
}

/// POST /events/:id/markers
pub async fn set_marker(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::MarkerRequest>,
) -> SnapshotResponse {
    let event_id: EventId = dto::parse_id(&id, "event id")?;

    respond(
        services
            .schedule
            .set_marker(event_id, body.slot_index, body.time_display),
    )
}

/// DELETE /events/:id/markers/:marker_id
pub async fn delete_marker(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, marker_id)): Path<(String, String)>,
) -> SnapshotResponse {
    let event_id: EventId = dto::parse_id(&id, "event id")?;
    let marker_id: MarkerId = dto::parse_id(&marker_id, "marker id")?;

    respond(services.schedule.delete_marker(event_id, marker_id))
}

/// POST /events/:id/now-playing
pub async fn set_now_playing(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::NowPlayingRequest>,
) -> SnapshotResponse {
    let event_id: EventId = dto::parse_id(&id, "event id")?;

    respond(services.schedule.set_now_playing(event_id, body.slot_index))
}
