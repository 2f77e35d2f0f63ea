pub mod serial;
pub mod telemetry;
pub mod icon;
pub mod acquisition;
pub mod display;
pub mod config;
pub mod worker;

use std::sync::Arc;
use acquisition::{AcquisitionLoop, Backoff, SerialConnector};
use config::Config;
use display::{DisplayRefresh, StatusBar};
use telemetry::TelemetryStore;

/// Run the telemetry pipeline and the status-bar refresh until Ctrl-C
pub async fn run<B>(config: Config, bar: B) -> anyhow::Result<()>
where
  B: StatusBar + 'static,
{
  // Shared between the acquisition thread (writer) and the display ticker
  let store = Arc::new(TelemetryStore::new());

  let acquisition = AcquisitionLoop::new(
    SerialConnector::new(config.serial.clone()),
    store.clone(),
    config.icon.path.clone(),
    Backoff::from(&config.reconnect),
  );
  let acquisition_handle = acquisition::spawn(acquisition);

  let display_handle = display::spawn(
    DisplayRefresh::new(store.clone(), bar),
    config.display.refresh_interval(),
  );

  log::info!(
    "Monitoring {} (icon: {})",
    config.serial.device_path,
    config.icon.path.display()
  );

  let signal = tokio::signal::ctrl_c().await;

  display_handle.stop().await;
  if let Some(stats) = acquisition_handle.stop().await {
    log::info!(
      "Acquisition summary: {} frames committed, {} icon failures, {} connect failures",
      stats.frames_committed,
      stats.icon_failures,
      stats.connect_failures
    );
  }

  signal?;
  Ok(())
}
