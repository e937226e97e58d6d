//! HTTP API: routing, request/response mapping, configuration and the SSE live feed.

pub mod app;
pub mod config;
pub mod middleware;
