use axum::{
    Router,
    routing::{delete, get, post, put},
};

pub mod events;
pub mod lineup;
pub mod stream;
pub mod system;

/// Router for every event endpoint.
pub fn router() -> Router {
    Router::new()
        .route("/events", get(events::list_upcoming).post(events::create_event))
        .route("/events/current", get(events::current_event))
        .route(
            "/events/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/events/:id/performers", post(lineup::add_performer))
        .route(
            "/events/:id/performers/:performer_id",
            delete(lineup::remove_performer),
        )
        .route("/events/:id/sort", post(lineup::sort_slot))
        .route("/events/:id/slots/:slot_id", put(lineup::update_slot))
        .route("/events/:id/markers", post(lineup::set_marker))
        .route("/events/:id/markers/:marker_id", delete(lineup::delete_marker))
        .route("/events/:id/now-playing", post(lineup::set_now_playing))
        .route("/events/:id/stream", get(stream::stream_event))
        .route("/viewers", get(system::viewers))
}
