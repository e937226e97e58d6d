//! Live schedule stream over Server-Sent Events.
//!
//! Each connection runs its own `LiveFeed`. The first SSE message is the
//! current snapshot; every later message is a full snapshot published after a
//! change. Closing the connection drops the receiving end, which ends the feed
//! and releases its bus subscription.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{
        Response,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
};
use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt, wrappers::ReceiverStream};
use tracing::{debug, warn};

use lineup_core::EventId;
use lineup_schedule::EventSnapshot;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// SSE event name carried by every schedule message.
const SCHEDULE_EVENT: &str = "event";

/// GET /events/:id/stream
pub async fn stream_event(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, Response> {
    let event_id: EventId = dto::parse_id(&id, "event id")?;

    let (tx, mut rx) = mpsc::channel::<EventSnapshot>(1);
    let feed = services.feed.clone();
    let task = tokio::spawn(async move {
        let result = feed.run(event_id, tx).await;
        match &result {
            Ok(exit) => debug!(event_id = %event_id, ?exit, "live feed ended"),
            Err(err) => debug!(event_id = %event_id, error = %err, "live feed failed"),
        }
        result
    });

    // The feed reports load/subscribe failures before its first message.
    let Some(first) = rx.recv().await else {
        return Err(match task.await {
            Ok(Err(err)) => errors::feed_error_to_response(err),
            Ok(Ok(_)) | Err(_) => errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "feed_error",
                "live feed ended before sending the schedule",
            ),
        });
    };

    let retry = services.stream.retry;
    let messages = tokio_stream::once(first)
        .chain(ReceiverStream::new(rx))
        .filter_map(move |snapshot| match to_sse(&snapshot, retry) {
            Ok(event) => Some(Ok(event)),
            Err(err) => {
                warn!(event_id = %snapshot.id, error = %err, "failed to encode snapshot");
                None
            }
        });

    Ok(Sse::new(messages).keep_alive(KeepAlive::new().interval(services.stream.keep_alive)))
}

fn to_sse(snapshot: &EventSnapshot, retry: std::time::Duration) -> Result<SseEvent, axum::Error> {
    SseEvent::default()
        .event(SCHEDULE_EVENT)
        .retry(retry)
        .json_data(snapshot)
}
