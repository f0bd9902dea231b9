//! # Kasir Server
//!
//! axum application exposing the back office over HTTP. Every handler is a
//! thin translation between JSON and one engine call; no business rule lives
//! here.
//!
//! ## Module Organization
//! - `config` - `ServerConfig` (TOML + `KASIR_*` env) and `StoreSettings`
//! - `error` - `ApiError`, the JSON error body and its status codes
//! - `routes` - handlers and the `x-cashier-id` extractor
//! - `state` - `AppState` shared by all handlers

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the application router with request tracing.
pub fn app(state: AppState) -> Router {
    routes::router()
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
