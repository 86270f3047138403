//! Database initialization

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL mode allows concurrent readers with one writer, which keeps the
    // optimistic summary merge cheap under concurrent sessions
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    // Set busy timeout
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_tables(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent - safe to call multiple times)
///
/// Split out from [`init_database`] so tests can apply the schema to an
/// in-memory pool.
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_cameras_table(pool).await?;
    create_daily_summary_table(pool).await?;
    Ok(())
}

async fn create_cameras_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cameras (
            guid TEXT PRIMARY KEY,
            location TEXT NOT NULL,
            video_source TEXT NOT NULL,
            notification_threshold INTEGER NOT NULL DEFAULT 5,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_daily_summary_table(pool: &SqlitePool) -> Result<()> {
    // version backs the optimistic read-modify-write in summary.rs; writers
    // only commit against the version they read
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS daily_summary (
            camera_guid TEXT NOT NULL,
            date TEXT NOT NULL,
            total_count INTEGER NOT NULL DEFAULT 0,
            version INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (camera_guid, date)
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
