pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod shutdown;
pub mod state;

use std::sync::Arc;

use axum::routing::{delete, get, patch};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the HTTP surface. `api_prefix` is either empty or starts with `/`.
pub fn router(state: Arc<AppState>, api_prefix: &str) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/bookings",
            get(handlers::bookings::list_bookings).post(handlers::bookings::create_booking),
        )
        .route("/bookings/stats", get(handlers::bookings::booking_stats))
        .route("/bookings/:id", delete(handlers::bookings::delete_booking))
        .route(
            "/bookings/:id/status",
            patch(handlers::bookings::update_booking_status),
        );

    let app = if api_prefix.is_empty() {
        api
    } else {
        Router::new().nest(api_prefix, api)
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
