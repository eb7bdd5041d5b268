//! Runner configuration.
//!
//! Loaded from a YAML file (every field optional) and then overridden by
//! command-line flags. `validate` runs last, on the merged result.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;

use mcucon_board::{BoardKind, SimulatedBoardConfig};
use mcucon_core::ConsoleConfig;
use serde::{Deserialize, Serialize};

use crate::error::{RunnerError, RunnerResult};

// ============================================================================
// Configuration Types
// ============================================================================

/// HTTP surface settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Listen address.
    pub listen: String,
    /// Serve HTTP even on boards without WiFi. `None` follows the board.
    pub enabled: Option<bool>,
    /// Pause between streamed camera frames.
    pub frame_interval_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            listen: "127.0.0.1:8080".to_string(),
            enabled: None,
            frame_interval_ms: 100,
        }
    }
}

/// Metrics exporter settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus scrape address; only used with the `prometheus` feature.
    pub prometheus_listen: Option<String>,
}

/// Complete runner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Firmware variant to run.
    pub board: BoardKind,
    /// TCP port standing in for the wired serial line.
    pub serial_port: u16,
    /// TCP port standing in for Bluetooth serial, on boards that have it.
    pub bluetooth_port: u16,
    /// Sleep between polling rounds.
    pub poll_interval_ms: u64,
    pub http: HttpConfig,
    pub console: ConsoleConfig,
    /// Simulated peripherals.
    pub simulation: SimulatedBoardConfig,
    pub metrics: MetricsConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            board: BoardKind::Uno,
            serial_port: 5555,
            bluetooth_port: 5556,
            poll_interval_ms: 5,
            http: HttpConfig::default(),
            console: ConsoleConfig::default(),
            simulation: SimulatedBoardConfig {
                realtime: true,
                ..SimulatedBoardConfig::default()
            },
            metrics: MetricsConfig::default(),
        }
    }
}

/// Values supplied on the command line; `None` keeps the file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub board: Option<BoardKind>,
    pub serial_port: Option<u16>,
    pub bluetooth_port: Option<u16>,
    pub http: Option<String>,
}

impl RunnerConfig {
    /// Parse a YAML document.
    pub fn from_yaml(text: &str) -> RunnerResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load a YAML file.
    pub fn load(path: &Path) -> RunnerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Apply command-line overrides. An explicit `--http` address also turns
    /// the HTTP surface on.
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(board) = overrides.board {
            self.board = board;
        }
        if let Some(port) = overrides.serial_port {
            self.serial_port = port;
        }
        if let Some(port) = overrides.bluetooth_port {
            self.bluetooth_port = port;
        }
        if let Some(listen) = &overrides.http {
            self.http.listen = listen.clone();
            self.http.enabled = Some(true);
        }
    }

    /// Whether the Bluetooth serial channel exists on this board.
    pub fn bluetooth_enabled(&self) -> bool {
        self.board.profile().features.bluetooth
    }

    /// Whether the HTTP surface should be served.
    pub fn http_enabled(&self) -> bool {
        self.http
            .enabled
            .unwrap_or(self.board.profile().features.wifi)
    }

    /// Check the merged configuration.
    pub fn validate(&self) -> RunnerResult<()> {
        if self.console.max_line_length == 0 {
            return Err(RunnerError::Config(
                "console.max_line_length must be at least 1".to_string(),
            ));
        }
        if self.console.wifi_connect_attempts == 0 {
            return Err(RunnerError::Config(
                "console.wifi_connect_attempts must be at least 1".to_string(),
            ));
        }

        let mut ports: Vec<(&str, u16)> = vec![("serial_port", self.serial_port)];
        if self.bluetooth_enabled() {
            ports.push(("bluetooth_port", self.bluetooth_port));
        }
        if self.http_enabled() {
            let addr: SocketAddr = self.http.listen.parse().map_err(|e| {
                RunnerError::Config(format!("invalid http.listen {:?}: {}", self.http.listen, e))
            })?;
            ports.push(("http.listen", addr.port()));
        }

        let mut seen = HashSet::new();
        for (name, port) in &ports {
            // Port 0 asks the OS for a free port, so it never collides
            if *port != 0 && !seen.insert(*port) {
                return Err(RunnerError::Config(format!(
                    "{} uses port {} which is already assigned",
                    name, port
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RunnerConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.http_enabled());
        assert!(config.simulation.realtime);
    }

    #[test]
    fn test_esp32_enables_http() {
        let config = RunnerConfig {
            board: BoardKind::Esp32Cam,
            ..Default::default()
        };
        assert!(config.http_enabled());
        assert!(config.bluetooth_enabled());
    }

    #[test]
    fn test_http_override_forces_http() {
        let mut config = RunnerConfig::default();
        config.apply(&Overrides {
            http: Some("0.0.0.0:9000".to_string()),
            ..Default::default()
        });
        assert!(config.http_enabled());
        assert_eq!(config.http.listen, "0.0.0.0:9000");
    }
}
