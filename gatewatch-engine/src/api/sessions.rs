//! Session control endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use gatewatch_common::db::{self, summary};
use gatewatch_common::{time, Error};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ApiError;
use crate::session::spawn_session;
use crate::state::AppState;
use crate::tracker::TrackerConfig;

/// Body for POST /api/cameras/:id/session/start; all fields optional
#[derive(Debug, Default, Deserialize)]
pub struct StartSessionRequest {
    pub confidence_threshold: Option<f32>,
    pub target_class: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub camera_id: Uuid,
    pub running: bool,
    /// Today's committed daily total for the camera
    pub today_total: i64,
}

/// POST /api/cameras/:id/session/start
///
/// Starts a background analysis session. 409 if one is already running,
/// 404 if the camera or its video source does not exist.
pub async fn start_session(
    State(state): State<AppState>,
    Path(camera_id): Path<Uuid>,
    body: Option<Json<StartSessionRequest>>,
) -> Result<StatusCode, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();

    let mut config = TrackerConfig::default();
    if let Some(confidence) = request.confidence_threshold {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ApiError::BadRequest(
                "confidence_threshold must be within 0.0..=1.0".to_string(),
            ));
        }
        config.confidence_threshold = confidence;
    }
    if let Some(class) = request.target_class {
        config.target_class = class;
    }

    let camera = db::get_camera(&state.db, camera_id).await?;

    spawn_session(&state, camera, config).await.map_err(|e| match e {
        // Session already registered for this camera
        Error::InvalidInput(msg) => ApiError::Conflict(msg),
        other => other.into(),
    })?;

    Ok(StatusCode::ACCEPTED)
}

/// POST /api/cameras/:id/session/stop
///
/// Requests a cooperative stop; the in-flight frame completes before the
/// loop observes the flag. 404 if no session is running.
pub async fn stop_session(
    State(state): State<AppState>,
    Path(camera_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let sessions = state.sessions.read().await;
    let Some(handle) = sessions.get(&camera_id) else {
        return Err(ApiError::NotFound(format!(
            "no running session for camera {}",
            camera_id
        )));
    };
    *handle.stop.write().await = true;
    Ok(StatusCode::ACCEPTED)
}

/// GET /api/cameras/:id/session
pub async fn session_status(
    State(state): State<AppState>,
    Path(camera_id): Path<Uuid>,
) -> Result<Json<SessionStatusResponse>, ApiError> {
    let camera = db::get_camera(&state.db, camera_id).await?;

    // A running session mirrors its last committed total into the handle;
    // without one the store is authoritative
    let sessions = state.sessions.read().await;
    let (running, today_total) = match sessions.get(&camera.camera_id) {
        Some(handle) => (true, *handle.running_total.read().await),
        None => (
            false,
            summary::daily_total(&state.db, camera.camera_id, time::today()).await?,
        ),
    };

    Ok(Json(SessionStatusResponse {
        camera_id: camera.camera_id,
        running,
        today_total,
    }))
}
