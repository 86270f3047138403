//! Tracker adapter seam
//!
//! The engine only depends on two traits: a [`FrameSource`] producing frames
//! in order until end-of-stream, and a [`Tracker`] turning one frame into the
//! set of track identifiers currently visible. The production model runtime
//! plugs in behind these traits; the replay implementations here run the
//! same loop from a JSON-lines detection dump, which is also what the tests
//! drive the engine with.

use gatewatch_common::{Error, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;

/// Per-object label assigned by the tracking algorithm, stable across
/// consecutive frames for the same physical object within one session
pub type TrackId = i64;

/// One captured frame, opaque to the engine
#[derive(Debug, Clone)]
pub struct Frame {
    /// Position in the stream, starting at 0
    pub index: u64,
    /// Raw frame payload handed to the tracker
    pub payload: Vec<u8>,
}

/// Detection filter applied by the tracker adapter
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Minimum confidence for a detection to count
    pub confidence_threshold: f32,
    /// Object class the pipeline watches for
    pub target_class: i64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.4,
            target_class: 0,
        }
    }
}

/// Ordered frame supply with an end-of-stream signal
pub trait FrameSource: Send {
    /// Next frame, or `None` at end-of-stream. An unreadable source is an
    /// error and fatal for the session.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Frame-by-frame object tracker
pub trait Tracker: Send {
    /// Track identifiers currently visible in `frame`, filtered to the
    /// target class at or above the confidence threshold. An empty result is
    /// not an error (occlusion, low confidence).
    fn observe(&mut self, frame: &Frame, config: &TrackerConfig) -> Result<Vec<TrackId>>;
}

/// Frame source reading one frame per line from a JSON-lines dump
pub struct ReplaySource<R> {
    reader: R,
    next_index: u64,
}

impl ReplaySource<BufReader<File>> {
    /// Open a replay file; a missing file is fatal for the session
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            Error::NotFound(format!("video source {}: {}", path.display(), e))
        })?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl ReplaySource<Cursor<Vec<u8>>> {
    /// Replay from an in-memory dump
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::from_reader(Cursor::new(bytes))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            next_index: 0,
        }
    }
}

impl<R: BufRead + Send> FrameSource for ReplaySource<R> {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self.reader.read_line(&mut line)?;
            if read == 0 {
                return Ok(None);
            }
            if line.trim().is_empty() {
                continue;
            }
            let frame = Frame {
                index: self.next_index,
                payload: line.trim_end().as_bytes().to_vec(),
            };
            self.next_index += 1;
            return Ok(Some(frame));
        }
    }
}

/// One detection from a replay frame line
#[derive(Debug, Deserialize)]
struct ReplayDetection {
    class: i64,
    confidence: f32,
    /// Absent when the tracker could not associate the detection
    track_id: Option<TrackId>,
}

#[derive(Debug, Deserialize)]
struct ReplayFrame {
    #[serde(default)]
    detections: Vec<ReplayDetection>,
}

/// Tracker replaying recorded per-frame detections
#[derive(Default)]
pub struct ReplayTracker;

impl ReplayTracker {
    pub fn new() -> Self {
        Self
    }
}

impl Tracker for ReplayTracker {
    fn observe(&mut self, frame: &Frame, config: &TrackerConfig) -> Result<Vec<TrackId>> {
        let parsed: ReplayFrame = serde_json::from_slice(&frame.payload).map_err(|e| {
            Error::InvalidInput(format!("malformed replay frame {}: {}", frame.index, e))
        })?;

        Ok(parsed
            .detections
            .into_iter()
            .filter(|d| d.class == config.target_class)
            .filter(|d| d.confidence >= config.confidence_threshold)
            .filter_map(|d| d.track_id)
            .collect())
    }
}
