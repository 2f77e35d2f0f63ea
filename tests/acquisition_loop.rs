use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use boom_battery_lib::acquisition::{self, AcquisitionLoop, Backoff, Connector, CycleOutcome, TelemetrySource};
use boom_battery_lib::serial::{self, SerialError};
use boom_battery_lib::telemetry::TelemetryStore;

/// Replays scripted reads, then idles like a quiet port
struct ScriptedSource {
    reads: VecDeque<serial::Result<Option<Vec<u8>>>>,
}

impl ScriptedSource {
    fn new(reads: Vec<serial::Result<Option<Vec<u8>>>>) -> Self {
        Self { reads: reads.into() }
    }
}

impl TelemetrySource for ScriptedSource {
    fn read_line(&mut self) -> serial::Result<Option<Vec<u8>>> {
        match self.reads.pop_front() {
            Some(read) => read,
            None => {
                std::thread::sleep(Duration::from_millis(1));
                Ok(None)
            }
        }
    }
}

/// Hands out scripted connection attempts; fails once they run out
struct ScriptedConnector {
    attempts: VecDeque<serial::Result<ScriptedSource>>,
}

impl Connector for ScriptedConnector {
    type Source = ScriptedSource;

    fn connect(&mut self) -> serial::Result<ScriptedSource> {
        self.attempts
            .pop_front()
            .unwrap_or_else(|| Err(SerialError::DeviceUnavailable("unplugged".into())))
    }
}

fn line(text: &str) -> serial::Result<Option<Vec<u8>>> {
    Ok(Some(text.as_bytes().to_vec()))
}

fn scratch_icon(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("boom-battery-acq-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir.join("battery_icon.png")
}

fn idle_connector() -> ScriptedConnector {
    ScriptedConnector { attempts: VecDeque::new() }
}

#[test]
fn test_process_line_commits_and_keeps_previous_on_bad_input() {
    let store = Arc::new(TelemetryStore::new());
    let icon_path = scratch_icon("process");
    let mut acquisition = AcquisitionLoop::new(idle_connector(), store.clone(), icon_path.clone(), Backoff::default());

    assert!(matches!(acquisition.process_line(b"OK"), CycleOutcome::Malformed));
    assert!(store.current().is_none());
    assert!(!icon_path.exists(), "no icon before the first frame");

    match acquisition.process_line(b"+BATCG=1,85,0,1,0,0") {
        CycleOutcome::Committed(snapshot) => assert_eq!(snapshot.frame.percentage, 85),
        other => panic!("expected commit, got {:?}", other),
    }
    let decoded = image::open(&icon_path).expect("icon written");
    assert_eq!((decoded.width(), decoded.height()), (150, 70));

    assert!(matches!(acquisition.process_line(b"+BATCG=1,,0,,0,0"), CycleOutcome::Malformed));
    assert!(matches!(acquisition.process_line(b"+BATCG=1,\xff,0,1,0,0"), CycleOutcome::Undecodable));

    let current = store.current().unwrap();
    assert_eq!(current.seq, 1);
    assert_eq!(current.frame.percentage, 85);
    assert!(current.frame.charging);

    let stats = acquisition.stats();
    assert_eq!(stats.lines_read, 4);
    assert_eq!(stats.frames_committed, 1);
    assert_eq!(stats.malformed_lines, 2);
    assert_eq!(stats.decode_failures, 1);

    let _ = std::fs::remove_dir_all(icon_path.parent().unwrap());
}

#[test]
fn test_icon_write_failure_skips_commit() {
    let dir = std::env::temp_dir().join(format!("boom-battery-acq-blocked-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let blocker = dir.join("file");
    std::fs::write(&blocker, b"x").unwrap();

    let store = Arc::new(TelemetryStore::new());
    let mut acquisition = AcquisitionLoop::new(idle_connector(), store.clone(), blocker.join("icon.png"), Backoff::default());

    assert!(matches!(acquisition.process_line(b"+BATCG=1,50,0,0,0,0"), CycleOutcome::IconFailed));
    assert!(store.current().is_none());
    assert_eq!(acquisition.stats().icon_failures, 1);
    assert!(acquisition.stats().last_error.is_some());

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_reconnects_and_stops() {
    let store = Arc::new(TelemetryStore::new());
    let icon_path = scratch_icon("run");

    let connector = ScriptedConnector {
        attempts: VecDeque::from(vec![
            Err(SerialError::DeviceUnavailable("not yet".into())),
            Ok(ScriptedSource::new(vec![
                line("+BATCG=1,85,0,1,0,0"),
                Ok(None),
                line("garbage"),
                Err(SerialError::IoError(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))),
            ])),
            Ok(ScriptedSource::new(vec![line("+BATCG=1,40,0,0,0,0")])),
        ]),
    };
    let backoff = Backoff::new(Duration::from_millis(1), Duration::from_millis(5));
    let handle = acquisition::spawn(AcquisitionLoop::new(connector, store.clone(), icon_path.clone(), backoff));

    let deadline = Instant::now() + Duration::from_secs(5);
    while store.current().map_or(0, |s| s.seq) < 2 {
        assert!(Instant::now() < deadline, "acquisition did not commit both frames");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let stats = handle.stop().await.expect("acquisition stopped");
    assert_eq!(stats.frames_committed, 2);
    assert_eq!(stats.malformed_lines, 1);
    assert_eq!(stats.connect_failures, 1);
    assert_eq!(stats.reconnects, 1);

    let current = store.current().unwrap();
    assert_eq!(current.frame.percentage, 40);
    assert!(!current.frame.charging);

    let _ = std::fs::remove_dir_all(icon_path.parent().unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_interrupts_reconnect_backoff() {
    let store = Arc::new(TelemetryStore::new());
    let backoff = Backoff::new(Duration::from_secs(60), Duration::from_secs(60));
    let handle = acquisition::spawn(AcquisitionLoop::new(idle_connector(), store, scratch_icon("backoff"), backoff));

    tokio::time::sleep(Duration::from_millis(100)).await;
    let started = Instant::now();
    let stats = handle.stop().await.expect("stopped during backoff");
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(stats.connect_failures, 1);
    assert_eq!(stats.frames_committed, 0);
}
