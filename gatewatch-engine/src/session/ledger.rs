//! Seen-ID ledger
//!
//! Per-session set of track identifiers already counted. Owned exclusively
//! by the running session; lives in memory only and resets when the session
//! (re)starts. Identifiers are not stable across tracker restarts, so
//! persisting this set would not dedupe correctly anyway.

use crate::tracker::TrackId;
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct SeenIdLedger {
    seen: HashSet<TrackId>,
}

impl SeenIdLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record and return the identifiers in `visible` not seen before this
    /// session. Idempotent per ID: once returned, an ID never again counts
    /// as new for the lifetime of the session.
    pub fn reconcile(&mut self, visible: &[TrackId]) -> Vec<TrackId> {
        visible
            .iter()
            .copied()
            .filter(|id| self.seen.insert(*id))
            .collect()
    }

    /// Clear the ledger; called exactly when a session (re)starts
    pub fn reset(&mut self) {
        self.seen.clear();
    }

    /// Number of distinct identifiers ever seen this session
    pub fn distinct_seen(&self) -> usize {
        self.seen.len()
    }
}
