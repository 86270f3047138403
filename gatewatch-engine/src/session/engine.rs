//! Analysis session engine
//!
//! One synchronous per-camera loop: capture frame, track, reconcile against
//! the seen-ID ledger, commit the increment, check the threshold, publish
//! the gate signal. One frame is fully processed before the next is
//! captured; there is no parallel frame processing within a session.

use crate::gate::GatePublisher;
use crate::session::{notifier, SessionState};
use crate::state::{AppState, SessionHandle};
use crate::tracker::{FrameSource, ReplaySource, ReplayTracker, Tracker, TrackerConfig};
use gatewatch_common::db::{summary, Camera};
use gatewatch_common::events::{EventBus, GateEvent, SessionEndReason};
use gatewatch_common::{time, Error, Result};
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// A running per-camera analysis session
pub struct AnalysisSession {
    camera: Camera,
    db: SqlitePool,
    bus: EventBus,
    gate: Arc<dyn GatePublisher>,
    gate_topic: String,
    tracker_config: TrackerConfig,
    /// Cooperative stop flag, shared with the session handle
    stop: Arc<RwLock<bool>>,
    /// Running-total mirror for the status endpoint
    shared_total: Arc<RwLock<i64>>,
}

impl AnalysisSession {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        camera: Camera,
        db: SqlitePool,
        bus: EventBus,
        gate: Arc<dyn GatePublisher>,
        gate_topic: String,
        tracker_config: TrackerConfig,
        handle: &SessionHandle,
    ) -> Self {
        Self {
            camera,
            db,
            bus,
            gate,
            gate_topic,
            tracker_config,
            stop: Arc::clone(&handle.stop),
            shared_total: Arc::clone(&handle.running_total),
        }
    }

    /// Run the frame loop until end-of-stream, stop request, or a fatal
    /// source/tracker error
    pub async fn run(
        mut self,
        mut source: Box<dyn FrameSource>,
        mut tracker: Box<dyn Tracker>,
    ) -> Result<SessionEndReason> {
        let camera_id = self.camera.camera_id;
        // Fresh ledger and armed notifier for every (re)start
        let mut state = SessionState::new();

        info!(camera = %camera_id, location = %self.camera.location, "analysis session started");
        self.bus.broadcast_lossy(GateEvent::SessionStarted {
            camera_id,
            timestamp: time::now(),
        });

        let reason = loop {
            if *self.stop.read().await {
                break SessionEndReason::Stopped;
            }

            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break SessionEndReason::EndOfStream,
                Err(e) => {
                    error!(camera = %camera_id, "video source failed: {}", e);
                    self.end(camera_id, SessionEndReason::SourceError);
                    return Err(e);
                }
            };

            let visible = match tracker.observe(&frame, &self.tracker_config) {
                Ok(visible) => visible,
                Err(e) => {
                    error!(camera = %camera_id, "tracker failed: {}", e);
                    self.end(camera_id, SessionEndReason::SourceError);
                    return Err(e);
                }
            };

            // No identifiers (occlusion, low confidence) is zero new
            // detections, not an error
            let new_ids = state.seen.reconcile(&visible);
            if new_ids.is_empty() {
                continue;
            }
            let increment = new_ids.len() as i64;
            let today = time::today();

            match summary::commit_increment(&self.db, camera_id, today, increment).await {
                Ok(total) => {
                    state.running_total = total;
                    *self.shared_total.write().await = total;
                    self.bus.broadcast_lossy(GateEvent::DetectionsCounted {
                        camera_id,
                        frame_index: frame.index,
                        new_count: increment,
                        daily_total: total,
                        timestamp: time::now(),
                    });

                    let threshold = self.camera.notification_threshold;
                    if notifier::check(total, threshold, state.notified.already_notified(today)) {
                        state.notified.mark(today);
                        info!(
                            camera = %camera_id,
                            location = %self.camera.location,
                            total,
                            threshold,
                            "detection threshold crossed"
                        );
                        self.bus.broadcast_lossy(GateEvent::ThresholdCrossed {
                            camera_id,
                            total,
                            threshold,
                            timestamp: time::now(),
                        });
                    }
                }
                Err(e) => {
                    // Increment is lost for accounting; detection continues
                    warn!(camera = %camera_id, "daily count increment lost: {}", e);
                }
            }

            // The gate opens on any frame with new detections, regardless of
            // whether the commit landed
            self.gate.publish_open(&self.gate_topic);
            self.bus.broadcast_lossy(GateEvent::GateOpenRequested {
                camera_id,
                topic: self.gate_topic.clone(),
                timestamp: time::now(),
            });
        };

        info!(camera = %camera_id, ?reason, "analysis session ended");
        self.end(camera_id, reason);
        Ok(reason)
    }

    fn end(&self, camera_id: uuid::Uuid, reason: SessionEndReason) {
        self.bus.broadcast_lossy(GateEvent::SessionEnded {
            camera_id,
            reason,
            timestamp: time::now(),
        });
    }
}

/// Start a session for `camera` as a background task
///
/// Fails with `InvalidInput` if the camera already has a running session and
/// with `NotFound` if the camera's video source cannot be opened. The
/// session handle is registered before the task starts and removed by the
/// task when the loop ends.
pub async fn spawn_session(
    state: &AppState,
    camera: Camera,
    tracker_config: TrackerConfig,
) -> Result<()> {
    let mut sessions = state.sessions.write().await;
    if sessions.contains_key(&camera.camera_id) {
        return Err(Error::InvalidInput(format!(
            "camera {} already has a running session",
            camera.camera_id
        )));
    }

    // Opening the source is the fatal-for-this-session check; a missing
    // video source never registers a session
    let source = ReplaySource::open(Path::new(&camera.video_source))?;
    let tracker = ReplayTracker::new();

    let handle = SessionHandle::new();
    // Seed the running-total mirror with today's committed total so the
    // status endpoint never reports 0 for a freshly restarted session
    *handle.running_total.write().await =
        summary::daily_total(&state.db, camera.camera_id, time::today()).await?;
    let session = AnalysisSession::new(
        camera.clone(),
        state.db.clone(),
        state.bus.clone(),
        Arc::clone(&state.gate),
        state.settings.gate_topic.clone(),
        tracker_config,
        &handle,
    );

    let camera_id = camera.camera_id;
    let sessions_map = Arc::clone(&state.sessions);
    sessions.insert(camera_id, handle);

    tokio::spawn(async move {
        if let Err(e) = session.run(Box::new(source), Box::new(tracker)).await {
            error!(camera = %camera_id, "session aborted: {}", e);
        }
        sessions_map.write().await.remove(&camera_id);
    });

    Ok(())
}
