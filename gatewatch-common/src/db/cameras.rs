//! Camera registry
//!
//! Camera records are created via registration and read-only during
//! analysis; the engine only ever reads the threshold and video source.

use crate::{time, Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

/// A registered camera
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    pub camera_id: Uuid,
    /// Human-readable location label
    pub location: String,
    /// Video source reference (file path or device index)
    pub video_source: String,
    /// Daily count at which the one-shot notification fires
    pub notification_threshold: i64,
    pub latitude: f64,
    pub longitude: f64,
}

/// Camera registration request
#[derive(Debug, Clone, Deserialize)]
pub struct NewCamera {
    pub location: String,
    pub video_source: String,
    pub notification_threshold: i64,
    pub latitude: f64,
    pub longitude: f64,
}

/// Register a new camera and return the stored record
pub async fn insert_camera(pool: &SqlitePool, new: &NewCamera) -> Result<Camera> {
    if new.location.trim().is_empty() {
        return Err(Error::InvalidInput("location must not be empty".to_string()));
    }
    if new.video_source.trim().is_empty() {
        return Err(Error::InvalidInput(
            "video_source must not be empty".to_string(),
        ));
    }
    if new.notification_threshold < 1 {
        return Err(Error::InvalidInput(
            "notification_threshold must be at least 1".to_string(),
        ));
    }

    let camera_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO cameras (guid, location, video_source, notification_threshold, latitude, longitude, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(camera_id.to_string())
    .bind(&new.location)
    .bind(&new.video_source)
    .bind(new.notification_threshold)
    .bind(new.latitude)
    .bind(new.longitude)
    .bind(time::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(Camera {
        camera_id,
        location: new.location.clone(),
        video_source: new.video_source.clone(),
        notification_threshold: new.notification_threshold,
        latitude: new.latitude,
        longitude: new.longitude,
    })
}

/// Load one camera by id
pub async fn get_camera(pool: &SqlitePool, camera_id: Uuid) -> Result<Camera> {
    let record = sqlx::query_as::<_, (String, String, String, i64, f64, f64)>(
        "SELECT guid, location, video_source, notification_threshold, latitude, longitude FROM cameras WHERE guid = ?",
    )
    .bind(camera_id.to_string())
    .fetch_optional(pool)
    .await?;

    match record {
        Some(row) => Ok(camera_from_row(row)?),
        None => Err(Error::NotFound(format!("camera {}", camera_id))),
    }
}

/// List all registered cameras, ordered by location label
pub async fn list_cameras(pool: &SqlitePool) -> Result<Vec<Camera>> {
    let rows = sqlx::query_as::<_, (String, String, String, i64, f64, f64)>(
        "SELECT guid, location, video_source, notification_threshold, latitude, longitude FROM cameras ORDER BY location",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(camera_from_row).collect()
}

fn camera_from_row(row: (String, String, String, i64, f64, f64)) -> Result<Camera> {
    let camera_id = Uuid::parse_str(&row.0)
        .map_err(|e| Error::Internal(format!("malformed camera guid {}: {}", row.0, e)))?;
    Ok(Camera {
        camera_id,
        location: row.1,
        video_source: row.2,
        notification_threshold: row.3,
        latitude: row.4,
        longitude: row.5,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::create_tables(&pool).await.unwrap();
        pool
    }

    fn sample_camera() -> NewCamera {
        NewCamera {
            location: "Yabase park inlet".to_string(),
            video_source: "inlet.mp4".to_string(),
            notification_threshold: 5,
            latitude: 35.004,
            longitude: 135.862,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_roundtrip() {
        let pool = test_pool().await;
        let created = insert_camera(&pool, &sample_camera()).await.unwrap();

        let loaded = get_camera(&pool, created.camera_id).await.unwrap();
        assert_eq!(loaded.location, "Yabase park inlet");
        assert_eq!(loaded.notification_threshold, 5);
        assert_eq!(loaded.video_source, "inlet.mp4");
    }

    #[tokio::test]
    async fn test_get_unknown_camera_is_not_found() {
        let pool = test_pool().await;
        let result = get_camera(&pool, Uuid::new_v4()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_orders_by_location() {
        let pool = test_pool().await;
        let mut b = sample_camera();
        b.location = "B weir".to_string();
        let mut a = sample_camera();
        a.location = "A sluice".to_string();
        insert_camera(&pool, &b).await.unwrap();
        insert_camera(&pool, &a).await.unwrap();

        let cameras = list_cameras(&pool).await.unwrap();
        assert_eq!(cameras.len(), 2);
        assert_eq!(cameras[0].location, "A sluice");
        assert_eq!(cameras[1].location, "B weir");
    }

    #[tokio::test]
    async fn test_invalid_threshold_rejected() {
        let pool = test_pool().await;
        let mut cam = sample_camera();
        cam.notification_threshold = 0;
        let result = insert_camera(&pool, &cam).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
