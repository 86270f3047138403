//! Camera registry and history endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use gatewatch_common::db::{self, Camera, NewCamera};
use gatewatch_common::time;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ApiError;
use crate::state::AppState;

/// GET /api/cameras
pub async fn list_cameras(
    State(state): State<AppState>,
) -> Result<Json<Vec<Camera>>, ApiError> {
    let cameras = db::list_cameras(&state.db).await?;
    Ok(Json(cameras))
}

/// POST /api/cameras
///
/// Register a new camera and return the stored record.
pub async fn register_camera(
    State(state): State<AppState>,
    Json(new): Json<NewCamera>,
) -> Result<(StatusCode, Json<Camera>), ApiError> {
    let camera = db::insert_camera(&state.db, &new).await?;
    Ok((StatusCode::CREATED, Json(camera)))
}

/// Query parameters for history viewing
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Window size in days (defaults to the configured history window)
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub total_count: i64,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub camera_id: Uuid,
    pub entries: Vec<HistoryEntry>,
}

/// GET /api/cameras/:id/history
///
/// The most recent days up to and including today, chronological order,
/// 0 for days without detections.
pub async fn camera_history(
    State(state): State<AppState>,
    Path(camera_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let days = query.days.unwrap_or(state.settings.history_days);
    if days == 0 {
        return Err(ApiError::BadRequest("days must be at least 1".to_string()));
    }

    // 404 for unknown cameras rather than an all-zero window
    let camera = db::get_camera(&state.db, camera_id).await?;

    let entries = db::history(&state.db, camera.camera_id, time::today(), days)
        .await?
        .into_iter()
        .map(|e| HistoryEntry {
            date: e.date,
            total_count: e.total_count,
        })
        .collect();

    Ok(Json(HistoryResponse {
        camera_id: camera.camera_id,
        entries,
    }))
}
