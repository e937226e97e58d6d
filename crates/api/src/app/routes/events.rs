use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use lineup_core::EventId;
use lineup_schedule::EventSnapshot;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// GET /events: events starting no earlier than 24h ago.
pub async fn list_upcoming(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<EventSnapshot>>, Response> {
    services
        .schedule
        .upcoming_events(Utc::now())
        .map(Json)
        .map_err(errors::dispatch_error_to_response)
}

/// GET /events/current: the open mic happening now or next, `null` if none.
pub async fn current_event(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Option<EventSnapshot>>, Response> {
    services
        .schedule
        .current_event(Utc::now())
        .map(Json)
        .map_err(errors::dispatch_error_to_response)
}

pub async fn create_event(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::EventRequest>,
) -> Result<Response, Response> {
    let details = body.into_details()?;
    let snapshot = services
        .schedule
        .create_event(details)
        .map_err(errors::dispatch_error_to_response)?;
    Ok((StatusCode::CREATED, Json(snapshot)).into_response())
}

pub async fn get_event(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<EventSnapshot>, Response> {
    let event_id: EventId = dto::parse_id(&id, "event id")?;
    services
        .schedule
        .get_event(event_id)
        .map(Json)
        .map_err(errors::dispatch_error_to_response)
}

pub async fn update_event(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::EventRequest>,
) -> Result<Json<EventSnapshot>, Response> {
    let event_id: EventId = dto::parse_id(&id, "event id")?;
    let details = body.into_details()?;
    services
        .schedule
        .update_event(event_id, details)
        .map(Json)
        .map_err(errors::dispatch_error_to_response)
}

pub async fn delete_event(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<StatusCode, Response> {
    let event_id: EventId = dto::parse_id(&id, "event id")?;
    services
        .schedule
        .delete_event(event_id)
        .map_err(errors::dispatch_error_to_response)?;
    Ok(StatusCode::NO_CONTENT)
}
