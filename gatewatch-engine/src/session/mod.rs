//! Per-camera analysis sessions
//!
//! A session owns its reconciliation state explicitly: the seen-ID ledger,
//! the notification state, and the last committed running total. Nothing
//! about a session lives in ambient shared state.

pub mod engine;
pub mod ledger;
pub mod notifier;

pub use engine::{spawn_session, AnalysisSession};
pub use ledger::SeenIdLedger;
pub use notifier::NotificationState;

/// Reconciliation state owned by one running session
#[derive(Debug, Default)]
pub struct SessionState {
    /// Track identifiers already converted into a count this session
    pub seen: SeenIdLedger,
    /// One-shot notification bookkeeping
    pub notified: NotificationState,
    /// Last committed daily total observed by this session
    pub running_total: i64,
}

impl SessionState {
    /// Fresh state for a (re)started session: empty ledger, armed notifier
    pub fn new() -> Self {
        Self::default()
    }
}
