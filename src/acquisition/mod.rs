pub mod backoff;

pub use backoff::Backoff;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TryRecvError};

use crate::config::SerialConfig;
use crate::icon::{self, IconError};
use crate::serial::{self, SerialError, SerialLink};
use crate::telemetry::{self, TelemetrySnapshot, TelemetryStore};
use crate::worker::WorkerHandle;

/// Granularity of shutdown checks while waiting out a reconnect delay
const STOP_POLL: Duration = Duration::from_millis(50);

/// Anything that yields raw status records one at a time
pub trait TelemetrySource {
    /// `Ok(None)` when no record arrived within the source's read timeout
    fn read_line(&mut self) -> serial::Result<Option<Vec<u8>>>;
}

impl TelemetrySource for SerialLink {
    fn read_line(&mut self) -> serial::Result<Option<Vec<u8>>> {
        SerialLink::read_line(self)
    }
}

/// Opens a fresh source each time the loop (re)connects
pub trait Connector {
    type Source: TelemetrySource;

    fn connect(&mut self) -> serial::Result<Self::Source>;
}

/// Opens the configured serial device
pub struct SerialConnector {
    config: SerialConfig,
}

impl SerialConnector {
    pub fn new(config: SerialConfig) -> Self {
        Self { config }
    }
}

impl Connector for SerialConnector {
    type Source = SerialLink;

    fn connect(&mut self) -> serial::Result<SerialLink> {
        SerialLink::open(
            &self.config.device_path,
            self.config.baud_rate,
            self.config.read_timeout(),
            self.config.init_command.as_bytes(),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    #[error("Serial link error: {0}")]
    Serial(#[from] SerialError),

    #[error("Icon error: {0}")]
    Icon(#[from] IconError),
}

/// What a single record did to the store
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// Not valid UTF-8
    Undecodable,
    /// Not a complete battery status record
    Malformed,
    /// Parsed, but the icon could not be produced; store left untouched
    IconFailed,
    /// Icon written and the new snapshot published
    Committed(Arc<TelemetrySnapshot>),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AcquisitionStats {
    pub lines_read: u64,
    pub frames_committed: u64,
    pub malformed_lines: u64,
    pub decode_failures: u64,
    pub icon_failures: u64,
    pub connect_failures: u64,
    pub reconnects: u64,
    pub last_error: Option<String>,
}

/// Poll, parse, render and commit loop. Sole writer of the store.
pub struct AcquisitionLoop<C: Connector> {
    connector: C,
    store: Arc<TelemetryStore>,
    icon_path: PathBuf,
    backoff: Backoff,
    stats: AcquisitionStats,
}

impl<C: Connector> AcquisitionLoop<C> {
    pub fn new(connector: C, store: Arc<TelemetryStore>, icon_path: PathBuf, backoff: Backoff) -> Self {
        Self {
            connector,
            store,
            icon_path,
            backoff,
            stats: AcquisitionStats::default(),
        }
    }

    pub fn stats(&self) -> &AcquisitionStats {
        &self.stats
    }

    /// Handle one record: parse, render, persist the icon, then commit.
    pub fn process_line(&mut self, line: &[u8]) -> CycleOutcome {
        self.stats.lines_read += 1;

        if std::str::from_utf8(line).is_err() {
            self.stats.decode_failures += 1;
            log::debug!("Dropping undecodable record ({} bytes)", line.len());
            return CycleOutcome::Undecodable;
        }

        let Some(frame) = telemetry::parse(line) else {
            self.stats.malformed_lines += 1;
            log::trace!("Ignoring record: {}", String::from_utf8_lossy(line));
            return CycleOutcome::Malformed;
        };

        let image = icon::render(&frame);
        if let Err(e) = icon::write_icon(&image, &self.icon_path) {
            let e = AcquisitionError::from(e);
            log::error!("Keeping previous battery state: {}", e);
            self.stats.icon_failures += 1;
            self.stats.last_error = Some(e.to_string());
            return CycleOutcome::IconFailed;
        }

        let snapshot = self.store.commit(frame, &self.icon_path);
        self.stats.frames_committed += 1;
        log::debug!(
            "Battery {}% (charging: {}, code {:?})",
            snapshot.frame.percentage,
            snapshot.frame.charging,
            snapshot.frame.charge_code
        );
        CycleOutcome::Committed(snapshot)
    }

    /// Run until a stop signal arrives (or every sender is dropped).
    ///
    /// Open failures are retried with backoff; I/O errors on an open link
    /// drop it and reconnect.
    pub fn run(mut self, mut stop_rx: mpsc::Receiver<()>) -> AcquisitionStats {
        let start_time = Instant::now();
        log::info!("Starting battery telemetry acquisition");

        'connect: while !stop_requested(&mut stop_rx) {
            let mut source = match self.connector.connect() {
                Ok(source) => {
                    self.backoff.reset();
                    source
                }
                Err(e) => {
                    let delay = self.backoff.next_delay();
                    self.stats.connect_failures += 1;
                    self.stats.last_error = Some(e.to_string());
                    log::warn!("{}; retrying in {:?}", AcquisitionError::from(e), delay);
                    if wait_or_stop(&mut stop_rx, delay) {
                        break;
                    }
                    continue;
                }
            };

            loop {
                if stop_requested(&mut stop_rx) {
                    break 'connect;
                }
                match source.read_line() {
                    Ok(Some(line)) => {
                        self.process_line(&line);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        log::error!("Serial read failed, reconnecting: {}", e);
                        self.stats.last_error = Some(e.to_string());
                        self.stats.reconnects += 1;
                        break;
                    }
                }
            }
        }

        log::info!(
            "Stopped battery telemetry acquisition after {:?} ({} lines, {} frames committed, {} malformed, {} reconnects)",
            start_time.elapsed(),
            self.stats.lines_read,
            self.stats.frames_committed,
            self.stats.malformed_lines,
            self.stats.reconnects
        );
        self.stats
    }
}

/// Start the loop on a dedicated blocking thread
pub fn spawn<C>(acquisition: AcquisitionLoop<C>) -> WorkerHandle<AcquisitionStats>
where
    C: Connector + Send + 'static,
{
    let (stop_tx, stop_rx) = mpsc::channel(1);
    let task_handle = tokio::task::spawn_blocking(move || acquisition.run(stop_rx));
    WorkerHandle::new("acquisition", task_handle, stop_tx)
}

fn stop_requested(stop_rx: &mut mpsc::Receiver<()>) -> bool {
    match stop_rx.try_recv() {
        Ok(()) | Err(TryRecvError::Disconnected) => true,
        Err(TryRecvError::Empty) => false,
    }
}

/// Sleep for `delay`, returning early (true) if a stop is requested
fn wait_or_stop(stop_rx: &mut mpsc::Receiver<()>, delay: Duration) -> bool {
    let deadline = Instant::now() + delay;
    loop {
        if stop_requested(stop_rx) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        std::thread::sleep(STOP_POLL.min(deadline - now));
    }
}
