//! HTTP surface

pub mod webhook;

use axum::{Router, routing};

use crate::SharedState;

pub const HANDLER_PATH: &str = "/handler";

/// Create the API router
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route(HANDLER_PATH, routing::post(webhook::handle_webhook))
        .with_state(state)
}
