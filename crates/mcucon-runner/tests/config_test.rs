//! Configuration loading and validation.

use mcucon_board::BoardKind;
use mcucon_runner::{Overrides, RunnerConfig, RunnerError};

const FULL_CONFIG: &str = r#"
board: esp32-cam
serial_port: 6000
bluetooth_port: 6001
poll_interval_ms: 2
http:
  listen: "127.0.0.1:9090"
  frame_interval_ms: 50
console:
  max_line_length: 128
  wifi_connect_attempts: 5
simulation:
  realtime: true
  i2c_devices: [39, 60]
  networks:
    - ssid: LabNet
      password: secret
    - ssid: Guest
      rssi: -80
  camera:
    present: false
"#;

#[test]
fn test_full_config_loads() {
    let config = RunnerConfig::from_yaml(FULL_CONFIG).unwrap();
    assert_eq!(config.board, BoardKind::Esp32Cam);
    assert_eq!(config.serial_port, 6000);
    assert_eq!(config.http.listen, "127.0.0.1:9090");
    assert_eq!(config.http.frame_interval_ms, 50);
    assert_eq!(config.console.max_line_length, 128);
    // Unset console fields keep their defaults
    assert_eq!(config.console.blink_count, 5);
    assert_eq!(config.simulation.i2c_devices, vec![0x27, 0x3c]);
    assert_eq!(config.simulation.networks[0].rssi, -60);
    assert_eq!(config.simulation.networks[1].password, None);
    assert!(!config.simulation.camera.present);
    assert_eq!(config.simulation.camera.width, 800);
    assert!(config.validate().is_ok());
}

#[test]
fn test_empty_document_is_default() {
    let config = RunnerConfig::from_yaml("{}").unwrap();
    assert_eq!(config.board, BoardKind::Uno);
    assert_eq!(config.serial_port, 5555);
    assert!(config.simulation.realtime);
}

#[test]
fn test_unknown_board_is_rejected() {
    let err = RunnerConfig::from_yaml("board: mega").unwrap_err();
    assert!(matches!(err, RunnerError::Yaml(_)));
}

#[test]
fn test_zero_line_bound_is_rejected() {
    let config = RunnerConfig::from_yaml("console:\n  max_line_length: 0\n").unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("max_line_length"));
}

#[test]
fn test_duplicate_ports_are_rejected() {
    let config = RunnerConfig::from_yaml(
        "board: uno-bluetooth\nserial_port: 7000\nbluetooth_port: 7000\n",
    )
    .unwrap();
    assert!(matches!(config.validate(), Err(RunnerError::Config(_))));

    // Bluetooth port is unused on the plain Uno
    let config = RunnerConfig::from_yaml("serial_port: 7000\nbluetooth_port: 7000\n").unwrap();
    assert!(config.validate().is_ok());
}

#[test]
fn test_http_port_collision() {
    let mut config = RunnerConfig::from_yaml("board: esp32-cam\nserial_port: 8080\n").unwrap();
    assert!(config.validate().is_err());

    config.apply(&Overrides {
        http: Some("127.0.0.1:8081".to_string()),
        ..Default::default()
    });
    assert!(config.validate().is_ok());
}

#[test]
fn test_ephemeral_ports_never_collide() {
    let config = RunnerConfig::from_yaml(
        "board: esp32-cam\nserial_port: 0\nbluetooth_port: 0\nhttp:\n  listen: \"127.0.0.1:0\"\n",
    )
    .unwrap();
    assert!(config.validate().is_ok());
}

#[test]
fn test_bad_listen_address() {
    let config = RunnerConfig::from_yaml("board: esp32-cam\nhttp:\n  listen: nowhere\n").unwrap();
    assert!(matches!(config.validate(), Err(RunnerError::Config(_))));
}

#[test]
fn test_overrides_replace_file_values() {
    let mut config = RunnerConfig::from_yaml(FULL_CONFIG).unwrap();
    config.apply(&Overrides {
        board: Some(BoardKind::Uno),
        serial_port: Some(7100),
        ..Default::default()
    });
    assert_eq!(config.board, BoardKind::Uno);
    assert_eq!(config.serial_port, 7100);
    assert_eq!(config.bluetooth_port, 6001);
    assert!(!config.http_enabled());
}

#[test]
fn test_load_missing_file() {
    let err = RunnerConfig::load(std::path::Path::new("/nonexistent/mcucon.yaml")).unwrap_err();
    assert!(matches!(err, RunnerError::Io(_)));
}
