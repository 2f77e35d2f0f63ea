use std::path::{Path, PathBuf};
use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use super::TelemetryFrame;

/// Immutable pairing of a frame with the icon rendered from it
#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySnapshot {
    pub frame: TelemetryFrame,
    pub icon_path: PathBuf,
    /// Increments once per commit, starting at 1
    pub seq: u64,
    pub committed_at: DateTime<Utc>,
}

/// Latest telemetry shared between the acquisition thread (sole writer)
/// and display consumers.
///
/// Each commit publishes a whole new snapshot, so a reader always sees a
/// frame and icon that were committed together.
pub struct TelemetryStore {
    tx: watch::Sender<Option<Arc<TelemetrySnapshot>>>,
}

impl TelemetryStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Replace the current frame and icon as one unit
    pub fn commit(&self, frame: TelemetryFrame, icon_path: &Path) -> Arc<TelemetrySnapshot> {
        let seq = self.tx.borrow().as_ref().map_or(0, |s| s.seq) + 1;
        let snapshot = Arc::new(TelemetrySnapshot {
            frame,
            icon_path: icon_path.to_path_buf(),
            seq,
            committed_at: Utc::now(),
        });
        self.tx.send_replace(Some(snapshot.clone()));
        snapshot
    }

    /// Latest committed snapshot, `None` before the first successful cycle
    pub fn current(&self) -> Option<Arc<TelemetrySnapshot>> {
        self.tx.borrow().clone()
    }

    /// Receiver that is notified on every commit
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<TelemetrySnapshot>>> {
        self.tx.subscribe()
    }
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}
