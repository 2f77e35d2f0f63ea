use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::telemetry::{TelemetrySnapshot, TelemetryStore};
use crate::worker::WorkerHandle;

/// Title shown until the first reading is committed
pub const PLACEHOLDER_TITLE: &str = "--";

/// Status-bar surface the refresh loop pushes into
pub trait StatusBar: Send {
    fn set_title(&mut self, title: &str);
    fn set_icon(&mut self, path: &Path);
}

/// Periodic consumer of the telemetry store.
///
/// Every tick re-applies the latest title and icon path; the status bar is
/// expected to reload the icon file from disk.
pub struct DisplayRefresh<B: StatusBar> {
    store: Arc<TelemetryStore>,
    bar: B,
}

impl<B: StatusBar> DisplayRefresh<B> {
    pub fn new(store: Arc<TelemetryStore>, bar: B) -> Self {
        Self { store, bar }
    }

    pub fn bar(&self) -> &B {
        &self.bar
    }

    /// One refresh tick
    pub fn refresh(&mut self) -> Option<Arc<TelemetrySnapshot>> {
        match self.store.current() {
            Some(snapshot) => {
                self.bar.set_title(&snapshot.frame.title());
                self.bar.set_icon(&snapshot.icon_path);
                Some(snapshot)
            }
            None => {
                self.bar.set_title(PLACEHOLDER_TITLE);
                None
            }
        }
    }

    /// Refresh on a fixed ticker until stopped; hands the bar back.
    pub async fn run(mut self, period: Duration, mut stop_rx: mpsc::Receiver<()>) -> B {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = stop_rx.recv() => break,
                _ = ticker.tick() => {
                    self.refresh();
                }
            }
        }

        self.bar
    }
}

/// Start the refresh ticker as a tokio task
pub fn spawn<B>(display: DisplayRefresh<B>, period: Duration) -> WorkerHandle<B>
where
    B: StatusBar + 'static,
{
    let (stop_tx, stop_rx) = mpsc::channel(1);
    let task_handle = tokio::spawn(display.run(period, stop_rx));
    WorkerHandle::new("display refresh", task_handle, stop_tx)
}

/// Status bar that reports changes through the log
#[derive(Debug, Default)]
pub struct LogStatusBar {
    title: Option<String>,
    icon: Option<PathBuf>,
}

impl LogStatusBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn icon(&self) -> Option<&Path> {
        self.icon.as_deref()
    }
}

impl StatusBar for LogStatusBar {
    fn set_title(&mut self, title: &str) {
        if self.title.as_deref() != Some(title) {
            log::info!("Status bar title: {}", title);
            self.title = Some(title.to_string());
        }
    }

    fn set_icon(&mut self, path: &Path) {
        if self.icon.as_deref() != Some(path) {
            log::info!("Status bar icon: {}", path.display());
            self.icon = Some(path.to_path_buf());
        }
    }
}
