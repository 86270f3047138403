//! Integration tests for spawned analysis sessions
//!
//! Drives full sessions through `spawn_session` against a replay feed and
//! checks counting, gate publishing, event emission, and cleanup.

use gatewatch_common::config::{Settings, SettingsOverrides};
use gatewatch_common::db::{summary, Camera, NewCamera};
use gatewatch_common::events::{GateEvent, SessionEndReason};
use gatewatch_common::time;
use gatewatch_engine::gate::ChannelGatePublisher;
use gatewatch_engine::session::spawn_session;
use gatewatch_engine::tracker::TrackerConfig;
use gatewatch_engine::AppState;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    gatewatch_common::db::create_tables(&pool).await.unwrap();
    pool
}

fn setup_state(db: SqlitePool) -> (AppState, mpsc::UnboundedReceiver<String>) {
    let (gate, rx) = ChannelGatePublisher::new();
    let settings = Settings::resolve_with_file(&SettingsOverrides::default(), None).unwrap();
    (AppState::new(db, gate, settings), rx)
}

fn write_feed(path: &Path, frames: &[&[i64]]) {
    let mut dump = String::new();
    for ids in frames {
        let detections: Vec<String> = ids
            .iter()
            .map(|id| format!("{{\"class\":0,\"confidence\":0.9,\"track_id\":{}}}", id))
            .collect();
        dump.push_str(&format!("{{\"detections\":[{}]}}\n", detections.join(",")));
    }
    std::fs::write(path, dump).unwrap();
}

async fn register(state: &AppState, feed: &Path, threshold: i64) -> Camera {
    gatewatch_common::db::insert_camera(
        &state.db,
        &NewCamera {
            location: "weir".to_string(),
            video_source: feed.to_str().unwrap().to_string(),
            notification_threshold: threshold,
            latitude: 35.0,
            longitude: 135.9,
        },
    )
    .await
    .unwrap()
}

async fn wait_for_session_end(state: &AppState, camera_id: Uuid) {
    for _ in 0..100 {
        if !state.sessions.read().await.contains_key(&camera_id) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session for {} did not finish", camera_id);
}

#[tokio::test]
async fn test_session_counts_and_publishes_per_new_detection_frame() {
    let dir = tempfile::tempdir().unwrap();
    let feed = dir.path().join("feed.jsonl");
    write_feed(&feed, &[&[1, 2], &[1, 2, 3], &[3, 4], &[3, 4]]);

    let (state, mut gate_rx) = setup_state(setup_test_db().await);
    let camera = register(&state, &feed, 5).await;

    spawn_session(&state, camera.clone(), TrackerConfig::default())
        .await
        .unwrap();
    wait_for_session_end(&state, camera.camera_id).await;

    let total = summary::daily_total(&state.db, camera.camera_id, time::today())
        .await
        .unwrap();
    assert_eq!(total, 4);

    let mut publishes = 0;
    while gate_rx.try_recv().is_ok() {
        publishes += 1;
    }
    assert_eq!(publishes, 3);
}

#[tokio::test]
async fn test_session_emits_lifecycle_and_threshold_events() {
    let dir = tempfile::tempdir().unwrap();
    let feed = dir.path().join("feed.jsonl");
    write_feed(&feed, &[&[1, 2, 3], &[4, 5, 6]]);

    let (state, _gate_rx) = setup_state(setup_test_db().await);
    let camera = register(&state, &feed, 5).await;
    let mut events = state.bus.subscribe();

    spawn_session(&state, camera.clone(), TrackerConfig::default())
        .await
        .unwrap();
    wait_for_session_end(&state, camera.camera_id).await;

    let mut started = 0;
    let mut crossings = Vec::new();
    let mut ended = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            GateEvent::SessionStarted { .. } => started += 1,
            GateEvent::ThresholdCrossed { total, .. } => crossings.push(total),
            GateEvent::SessionEnded { reason, .. } => ended.push(reason),
            _ => {}
        }
    }
    assert_eq!(started, 1);
    assert_eq!(crossings, vec![6]);
    assert_eq!(ended, vec![SessionEndReason::EndOfStream]);
}

#[tokio::test]
async fn test_two_cameras_count_independently() {
    let dir = tempfile::tempdir().unwrap();
    let feed_a = dir.path().join("a.jsonl");
    let feed_b = dir.path().join("b.jsonl");
    write_feed(&feed_a, &[&[1, 2], &[3]]);
    write_feed(&feed_b, &[&[1], &[1]]);

    let (state, _gate_rx) = setup_state(setup_test_db().await);
    let camera_a = register(&state, &feed_a, 100).await;
    let camera_b = register(&state, &feed_b, 100).await;

    spawn_session(&state, camera_a.clone(), TrackerConfig::default())
        .await
        .unwrap();
    spawn_session(&state, camera_b.clone(), TrackerConfig::default())
        .await
        .unwrap();
    wait_for_session_end(&state, camera_a.camera_id).await;
    wait_for_session_end(&state, camera_b.camera_id).await;

    let today = time::today();
    // Track id 1 appears in both feeds; the ledgers are per-session, so each
    // camera counts it against its own summary only
    assert_eq!(
        summary::daily_total(&state.db, camera_a.camera_id, today).await.unwrap(),
        3
    );
    assert_eq!(
        summary::daily_total(&state.db, camera_b.camera_id, today).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn test_restarted_session_recounts_reassigned_ids() {
    let dir = tempfile::tempdir().unwrap();
    let feed = dir.path().join("feed.jsonl");
    write_feed(&feed, &[&[1, 2]]);

    let (state, _gate_rx) = setup_state(setup_test_db().await);
    let camera = register(&state, &feed, 100).await;

    spawn_session(&state, camera.clone(), TrackerConfig::default())
        .await
        .unwrap();
    wait_for_session_end(&state, camera.camera_id).await;

    // The ledger resets with the session; the same ids count again and the
    // daily summary keeps accumulating
    spawn_session(&state, camera.clone(), TrackerConfig::default())
        .await
        .unwrap();
    wait_for_session_end(&state, camera.camera_id).await;

    let total = summary::daily_total(&state.db, camera.camera_id, time::today())
        .await
        .unwrap();
    assert_eq!(total, 4);
}
