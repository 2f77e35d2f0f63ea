use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::Parser;

use boom_battery_lib::config::Config;
use boom_battery_lib::display::LogStatusBar;
use boom_battery_lib::serial::SerialLink;

/// Battery status-bar agent for serial-attached TNTgo devices.
#[derive(Parser, Debug)]
#[command(name = "boom-battery", version)]
struct Cli {
    /// TOML config file; built-in defaults are used when omitted.
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Serial device path (overrides the config file).
    #[arg(long)]
    device: Option<String>,
    /// Where to write the rendered battery icon (overrides the config file).
    #[arg(long)]
    icon_path: Option<PathBuf>,
    /// Log filter, e.g. `info` or `boom_battery_lib=debug` (RUST_LOG also applies).
    #[arg(long, default_value = "info")]
    log_level: String,
    /// List available serial ports and exit.
    #[arg(long)]
    list_ports: bool,
    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .parse_filters(&cli.log_level)
        .parse_default_env()
        .init();

    if cli.list_ports {
        for port in SerialLink::list_ports()? {
            match (port.vid, port.pid) {
                (Some(vid), Some(pid)) => println!(
                    "{}\t{:04X}:{:04X}\t{}",
                    port.port_name,
                    vid,
                    pid,
                    port.product.as_deref().unwrap_or("")
                ),
                _ => println!("{}", port.port_name),
            }
        }
        return Ok(());
    }

    let mut config = Config::load(cli.config.as_deref()).context("loading config")?;
    if let Some(device) = cli.device {
        config.serial.device_path = device;
    }
    if let Some(icon_path) = cli.icon_path {
        config.icon.path = icon_path;
    }

    if cli.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    log::info!("boom-battery {} started", env!("CARGO_PKG_VERSION"));
    boom_battery_lib::run(config, LogStatusBar::new()).await
}
