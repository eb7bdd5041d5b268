//! WiFi and Bluetooth commands.

use mcucon_board::{Board, NetworkInfo, WifiStatus};
use tracing::debug;

use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, ConsoleResult};

pub const WIFI_NOT_CONNECTED: &str = "WiFi not connected";

pub fn wifi_status<B: Board + ?Sized>(board: &B) -> ConsoleResult<String> {
    let status = board.wifi_status();
    match (status.connected, status.ssid, status.ip) {
        (true, Some(ssid), Some(ip)) => {
            let mut lines = vec![
                "WiFi connected".to_string(),
                format!("SSID: {}", ssid),
                format!("IP: {}", ip),
            ];
            if let Some(rssi) = status.rssi {
                lines.push(format!("RSSI: {} dBm", rssi));
            }
            lines.push(format!("MAC: {}", status.mac));
            Ok(lines.join("\n"))
        }
        _ => Err(ConsoleError::Unavailable(WIFI_NOT_CONNECTED)),
    }
}

pub fn format_networks(networks: &[NetworkInfo]) -> String {
    if networks.is_empty() {
        return "No networks found".to_string();
    }
    networks
        .iter()
        .enumerate()
        .map(|(i, net)| {
            format!(
                "{}: {} ({} dBm) [{}]",
                i + 1,
                net.ssid,
                net.rssi,
                if net.secured { "secured" } else { "open" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn wifi_scan<B: Board + ?Sized>(board: &mut B) -> ConsoleResult<String> {
    let networks = board.wifi_scan()?;
    Ok(format_networks(&networks))
}

/// Begin association and poll with a fixed delay until it completes or the
/// attempts run out.
pub fn associate<B: Board + ?Sized>(
    board: &mut B,
    config: &ConsoleConfig,
    ssid: &str,
    password: Option<&str>,
) -> ConsoleResult<WifiStatus> {
    board.wifi_begin(ssid, password)?;
    for attempt in 1..=config.wifi_connect_attempts {
        if board.wifi_poll() {
            debug!("Associated with {} after {} poll(s)", ssid, attempt);
            return Ok(board.wifi_status());
        }
        board.delay_ms(config.wifi_poll_interval_ms);
    }
    Err(ConsoleError::ConnectFailed {
        ssid: ssid.to_string(),
    })
}

pub fn wifi_connect<B: Board + ?Sized>(
    board: &mut B,
    config: &ConsoleConfig,
    ssid: &str,
    password: Option<&str>,
) -> ConsoleResult<String> {
    let status = associate(board, config, ssid, password)?;
    Ok(format!(
        "Connected to {}\nIP: {}",
        ssid,
        status.ip.unwrap_or_default()
    ))
}

pub fn bluetooth<B: Board + ?Sized>(board: &B) -> String {
    let status = board.bluetooth_status();
    [
        format!(
            "Bluetooth: {}",
            if status.enabled { "enabled" } else { "disabled" }
        ),
        format!("Device name: {}", status.device_name),
        format!(
            "Client: {}",
            if status.client_connected {
                "connected"
            } else {
                "not connected"
            }
        ),
    ]
    .join("\n")
}
