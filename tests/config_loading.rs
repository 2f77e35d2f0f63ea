use std::path::{Path, PathBuf};
use boom_battery_lib::acquisition::Backoff;
use boom_battery_lib::config::{Config, ConfigError};

#[test]
fn test_defaults_match_device_constants() {
    let cfg = Config::load(None).unwrap();
    assert_eq!(cfg.serial.device_path, "/dev/cu.usbmodem207236A254527");
    assert_eq!(cfg.serial.baud_rate, 115200);
    assert_eq!(cfg.serial.read_timeout_ms, 100);
    assert_eq!(cfg.serial.init_command, "at+adb\r\n");
    assert_eq!(cfg.icon.path, PathBuf::from("battery_icon.png"));
    assert_eq!(cfg.display.refresh_interval_ms, 1000);
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let cfg = Config::from_toml(
        r#"
        [serial]
        device_path = "/dev/ttyACM0"

        [icon]
        path = "/tmp/icons/battery.png"
        "#,
    )
    .unwrap();
    assert_eq!(cfg.serial.device_path, "/dev/ttyACM0");
    assert_eq!(cfg.serial.baud_rate, 115200);
    assert_eq!(cfg.icon.path, Path::new("/tmp/icons/battery.png"));
    assert_eq!(cfg.reconnect.max_delay_ms, 30_000);
}

#[test]
fn test_zero_values_are_sanitized() {
    let cfg = Config::from_toml(
        r#"
        [serial]
        baud_rate = 0
        read_timeout_ms = 0

        [display]
        refresh_interval_ms = 0

        [reconnect]
        initial_delay_ms = 2000
        max_delay_ms = 10
        "#,
    )
    .unwrap();
    assert_eq!(cfg.serial.baud_rate, 115200);
    assert_eq!(cfg.serial.read_timeout_ms, 100);
    assert_eq!(cfg.display.refresh_interval_ms, 1000);
    assert_eq!(cfg.reconnect.max_delay_ms, 2000);

    let mut backoff = Backoff::from(&cfg.reconnect);
    assert_eq!(backoff.next_delay().as_millis(), 2000);
    assert_eq!(backoff.next_delay().as_millis(), 2000);
}

#[test]
fn test_bad_input_reports_errors() {
    assert!(matches!(Config::from_toml("[serial]\nbaud_rate = \"fast\""), Err(ConfigError::Parse(_))));
    assert!(matches!(
        Config::load(Some(Path::new("/nonexistent/boom-battery.toml"))),
        Err(ConfigError::Io { .. })
    ));
}

#[test]
fn test_round_trips_through_toml() {
    let cfg = Config::default();
    let text = toml::to_string_pretty(&cfg).unwrap();
    assert_eq!(Config::from_toml(&text).unwrap(), cfg);
}

#[test]
fn test_example_file_matches_defaults() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("boom-battery.example.toml");
    assert_eq!(Config::load(Some(path.as_path())).unwrap(), Config::default());
}
