//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.
//! It is the control surface the menu of a desktop front end talks to.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/timer/start", post(start_handler))
        .route("/timer/stop", post(stop_handler))
        .route("/status", get(status_handler))
        .route("/sounds", get(sounds_handler).put(select_sound_handler))
        .route("/login-item", get(login_item_handler))
        .route("/login-item/toggle", post(toggle_login_item_handler))
        .route("/lock/test", post(test_lock_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
