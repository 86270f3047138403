//! Shared application state

use crate::gate::GatePublisher;
use gatewatch_common::config::Settings;
use gatewatch_common::events::EventBus;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Handle to one running analysis session
///
/// The session task owns its reconciliation state; the handle only carries
/// the cooperative stop flag and a snapshot of the running total for the
/// status endpoint.
#[derive(Clone)]
pub struct SessionHandle {
    /// Polled by the frame loop once per iteration; stopping is cooperative,
    /// an in-flight inference always completes first
    pub stop: Arc<RwLock<bool>>,
    /// Last committed daily total, mirrored by the session task
    pub running_total: Arc<RwLock<i64>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self {
            stop: Arc::new(RwLock::new(false)),
            running_total: Arc::new(RwLock::new(0)),
        }
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Application state shared across HTTP handlers and session tasks
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Event bus feeding the SSE stream
    pub bus: EventBus,
    /// Process-wide gate publisher shared by all sessions
    pub gate: Arc<dyn GatePublisher>,
    /// Resolved service settings
    pub settings: Settings,
    /// Running sessions, keyed by camera
    pub sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
}

impl AppState {
    pub fn new(db: SqlitePool, gate: Arc<dyn GatePublisher>, settings: Settings) -> Self {
        Self {
            db,
            bus: EventBus::default(),
            gate,
            settings,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}
