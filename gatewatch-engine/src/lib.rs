//! gatewatch-engine library - per-camera detection analysis service
//!
//! Runs analysis sessions that turn tracker output into deduplicated daily
//! counts, and serves the HTTP API for session control, camera records,
//! detection history, and the live event stream.

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod gate;
pub mod session;
pub mod state;
pub mod tracker;

pub use state::AppState;

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health_check))
        .route(
            "/api/cameras",
            get(api::list_cameras).post(api::register_camera),
        )
        .route("/api/cameras/:id/history", get(api::camera_history))
        .route("/api/cameras/:id/session/start", post(api::start_session))
        .route("/api/cameras/:id/session/stop", post(api::stop_session))
        .route("/api/cameras/:id/session", get(api::session_status))
        .route("/events", get(api::events))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
