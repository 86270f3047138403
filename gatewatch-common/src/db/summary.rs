//! Daily summary store
//!
//! One row per (camera, calendar date) holding the running total of newly
//! detected track identifiers. Updates go through an optimistic
//! read-modify-write: read (total, version), write total + increment only if
//! the version is unchanged, retry on conflict with bounded attempts. Rows
//! are created on first detection of a day and never deleted here.

use crate::{time, Error, Result};
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

/// Write-conflict retries before the commit is reported lost
const MAX_COMMIT_ATTEMPTS: u32 = 5;

/// One history entry: a calendar date and its committed total
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total_count: i64,
}

/// Transactionally merge `increment` into the (camera, date) running total
/// and return the resulting total.
///
/// Safe against concurrent callers on the same key: a conflicting write in
/// between the read and the write fails the version check and the merge is
/// retried from a fresh read. After [`MAX_COMMIT_ATTEMPTS`] conflicts the
/// commit surfaces [`Error::StoreUnavailable`] and the caller must not assume
/// the increment was applied.
pub async fn commit_increment(
    pool: &SqlitePool,
    camera_id: Uuid,
    date: NaiveDate,
    increment: i64,
) -> Result<i64> {
    if increment < 0 {
        return Err(Error::InvalidInput(
            "increment must not be negative".to_string(),
        ));
    }
    if increment == 0 {
        // Nothing to merge; do not create a row for a frame with no detections
        return daily_total(pool, camera_id, date).await;
    }

    let key = camera_id.to_string();
    let date_key = date.to_string();

    for attempt in 1..=MAX_COMMIT_ATTEMPTS {
        let current = sqlx::query_as::<_, (i64, i64)>(
            "SELECT total_count, version FROM daily_summary WHERE camera_guid = ? AND date = ?",
        )
        .bind(&key)
        .bind(&date_key)
        .fetch_optional(pool)
        .await?;

        match current {
            None => {
                // First detection of the day. A concurrent writer may create
                // the row between our read and this insert; DO NOTHING turns
                // that race into a zero-row write and we retry from a read.
                let result = sqlx::query(
                    r#"
                    INSERT INTO daily_summary (camera_guid, date, total_count, version)
                    VALUES (?, ?, ?, 1)
                    ON CONFLICT (camera_guid, date) DO NOTHING
                    "#,
                )
                .bind(&key)
                .bind(&date_key)
                .bind(increment)
                .execute(pool)
                .await?;

                if result.rows_affected() == 1 {
                    return Ok(increment);
                }
            }
            Some((total, version)) => {
                let new_total = total + increment;
                let result = sqlx::query(
                    r#"
                    UPDATE daily_summary
                    SET total_count = ?, version = version + 1
                    WHERE camera_guid = ? AND date = ? AND version = ?
                    "#,
                )
                .bind(new_total)
                .bind(&key)
                .bind(&date_key)
                .bind(version)
                .execute(pool)
                .await?;

                if result.rows_affected() == 1 {
                    return Ok(new_total);
                }
            }
        }

        debug!(
            camera = %camera_id,
            %date,
            attempt,
            "daily summary write conflict, retrying"
        );
    }

    Err(Error::StoreUnavailable {
        attempts: MAX_COMMIT_ATTEMPTS,
    })
}

/// Committed total for one (camera, date), 0 if no record exists
pub async fn daily_total(pool: &SqlitePool, camera_id: Uuid, date: NaiveDate) -> Result<i64> {
    let total: Option<i64> = sqlx::query_scalar(
        "SELECT total_count FROM daily_summary WHERE camera_guid = ? AND date = ?",
    )
    .bind(camera_id.to_string())
    .bind(date.to_string())
    .fetch_optional(pool)
    .await?;
    Ok(total.unwrap_or(0))
}

/// The `window_days` most recent days up to and including `today`, in
/// chronological order, with 0 substituted for dates without a record.
pub async fn history(
    pool: &SqlitePool,
    camera_id: Uuid,
    today: NaiveDate,
    window_days: u32,
) -> Result<Vec<DailyTotal>> {
    let dates = time::trailing_window(today, window_days);
    let Some(first) = dates.first() else {
        return Ok(Vec::new());
    };

    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT date, total_count FROM daily_summary
        WHERE camera_guid = ? AND date >= ? AND date <= ?
        "#,
    )
    .bind(camera_id.to_string())
    .bind(first.to_string())
    .bind(today.to_string())
    .fetch_all(pool)
    .await?;

    let recorded: std::collections::HashMap<String, i64> = rows.into_iter().collect();

    Ok(dates
        .into_iter()
        .map(|date| DailyTotal {
            total_count: recorded.get(&date.to_string()).copied().unwrap_or(0),
            date,
        })
        .collect())
}
