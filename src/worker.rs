use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};

/// How long `stop` waits for a worker before giving up on it
pub const STOP_TIMEOUT: Duration = Duration::from_secs(2);

/// Running background worker with its stop channel
pub struct WorkerHandle<T> {
    name: &'static str,
    task_handle: JoinHandle<T>,
    stop_tx: mpsc::Sender<()>,
}

impl<T> WorkerHandle<T> {
    pub fn new(name: &'static str, task_handle: JoinHandle<T>, stop_tx: mpsc::Sender<()>) -> Self {
        Self { name, task_handle, stop_tx }
    }

    /// Signal the worker and wait for it to finish (with timeout)
    pub async fn stop(self) -> Option<T> {
        let _ = self.stop_tx.send(()).await;

        match timeout(STOP_TIMEOUT, self.task_handle).await {
            Ok(Ok(output)) => {
                log::info!("Stopped {} worker", self.name);
                Some(output)
            }
            Ok(Err(e)) => {
                log::error!("{} worker failed: {}", self.name, e);
                None
            }
            Err(_) => {
                log::warn!("{} worker did not stop within {:?}", self.name, STOP_TIMEOUT);
                None
            }
        }
    }
}
