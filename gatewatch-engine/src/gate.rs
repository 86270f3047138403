//! Gate signal publisher
//!
//! Fire-and-forget delivery of the "OPEN" command to the gate broker. The
//! frame loop never waits on delivery and a failed publish only gets logged.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Command payload published when a frame has new detections
pub const OPEN_COMMAND: &str = "OPEN";

/// Best-effort outbound gate signaling
///
/// `publish_open` must return without blocking on delivery; ordering across
/// sessions is not guaranteed.
pub trait GatePublisher: Send + Sync {
    fn publish_open(&self, topic: &str);
}

/// Publishes gate commands over a long-lived, process-wide HTTP client
/// shared by all sessions
pub struct HttpGatePublisher {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpGatePublisher {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

impl GatePublisher for HttpGatePublisher {
    fn publish_open(&self, topic: &str) {
        let url = format!("{}/{}", self.endpoint.trim_end_matches('/'), topic);
        let client = self.client.clone();
        // Delivery happens off the frame loop; the session never observes it
        tokio::spawn(async move {
            match client.post(&url).body(OPEN_COMMAND).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(%url, "gate open published");
                }
                Ok(response) => {
                    warn!(%url, status = %response.status(), "gate broker rejected publish");
                }
                Err(e) => {
                    warn!(%url, "gate publish failed: {}", e);
                }
            }
        });
    }
}

/// Publisher delivering commands to an in-process channel
///
/// Used by tests and by embedders that bridge gate commands themselves. Drops
/// the command (with a log line) when the receiver is gone, preserving the
/// fire-and-forget contract.
pub struct ChannelGatePublisher {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelGatePublisher {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

impl GatePublisher for ChannelGatePublisher {
    fn publish_open(&self, topic: &str) {
        if self.tx.send(topic.to_string()).is_err() {
            warn!(topic, "gate publish dropped: no receiver");
        }
    }
}
