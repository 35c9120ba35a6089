pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/booking/user-event-types",
            get(handlers::booking::user_event_types),
        )
        .route(
            "/api/booking/event-type",
            get(handlers::booking::event_type_by_username),
        )
        .route(
            "/api/viewer/credentials",
            get(handlers::credentials::list_credentials),
        )
        .route(
            "/api/viewer/delete-credential",
            post(handlers::credentials::delete_credential),
        )
        .with_state(state)
}
