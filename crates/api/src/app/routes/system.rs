use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode};
use serde_json::{Value, json};

use crate::app::services::AppServices;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Open live feed count.
pub async fn viewers(Extension(services): Extension<Arc<AppServices>>) -> Json<Value> {
    Json(json!({ "viewers": services.viewer_count() }))
}
