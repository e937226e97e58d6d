use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use lineup_events::BusError;
use lineup_infra::{DispatchError, FeedError, RepositoryError};

pub fn dispatch_error_to_response(err: DispatchError) -> Response {
    match err {
        DispatchError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DispatchError::InvalidOrderBounds(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_order_bounds", msg)
        }
        DispatchError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DispatchError::Internal(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
        }
        DispatchError::Repository(e) => repository_error_to_response(e),
    }
}

pub fn repository_error_to_response(err: RepositoryError) -> Response {
    match err {
        RepositoryError::EventNotFound(id) => json_error(
            StatusCode::NOT_FOUND,
            "event_not_found",
            format!("event {id} not found"),
        ),
        RepositoryError::AlreadyExists(id) => json_error(
            StatusCode::CONFLICT,
            "conflict",
            format!("event {id} already exists"),
        ),
        RepositoryError::Storage(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", msg)
        }
    }
}

pub fn feed_error_to_response(err: FeedError) -> Response {
    match err {
        FeedError::Repository(e) => repository_error_to_response(e),
        FeedError::Bus(BusError::Closed) => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "shutting_down",
            "live updates are no longer available",
        ),
        FeedError::Bus(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "bus_error", e.to_string()),
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
