//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: repository, change bus, schedule service and live feed wiring
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and parsing helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::config::Settings;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router with fresh in-memory services.
pub fn build_app(settings: &Settings) -> Router {
    build_app_with_services(Arc::new(services::AppServices::in_memory(settings)))
}

/// Build the router around existing services (the binary keeps a handle for shutdown).
pub fn build_app_with_services(services: Arc<services::AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router().layer(Extension(services)))
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(middleware::trace_requests)))
}
