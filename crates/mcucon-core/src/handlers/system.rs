//! `status`, `info`, `memory`, `uptime` and `restart`.
//!
//! These are pure reads and never fail.

use mcucon_board::Board;
use mcucon_protocol::{format_uptime, ChannelId};

/// Text emitted before a restart is requested.
pub const RESTARTING: &str = "Restarting...";

pub fn status<B: Board + ?Sized>(board: &B, active: ChannelId) -> String {
    let profile = board.profile();
    let memory = board.memory();
    let mut lines = vec![
        format!("Board: {}", profile.name),
        format!("Uptime: {}", format_uptime(board.millis())),
        format!("Free memory: {} / {} bytes", memory.free, memory.total),
        format!("Active channel: {}", active),
    ];

    if profile.features.wifi {
        let wifi = board.wifi_status();
        lines.push(match (wifi.connected, wifi.ssid, wifi.ip) {
            (true, Some(ssid), Some(ip)) => format!("WiFi: connected to {} ({})", ssid, ip),
            _ => "WiFi: not connected".to_string(),
        });
    }
    if profile.features.camera {
        let ready = board.camera_status().initialized;
        lines.push(format!(
            "Camera: {}",
            if ready { "ready" } else { "not initialized" }
        ));
    }
    if profile.features.bluetooth {
        let bt = board.bluetooth_status();
        lines.push(format!(
            "Bluetooth: {}",
            if bt.client_connected {
                "client connected"
            } else {
                "waiting for client"
            }
        ));
    }
    lines.join("\n")
}

pub fn info<B: Board + ?Sized>(board: &B) -> String {
    let profile = board.profile();
    let chip = board.chip();
    let mut lines = vec![
        format!("Board: {}", profile.name),
        format!("Chip: {} ({} core(s) @ {} MHz)", chip.model, chip.cores, chip.cpu_mhz),
        format!("Flash: {} bytes", chip.flash_bytes),
        format!("SDK: {}", chip.sdk_version),
        format!("Baud rate: {}", profile.baud_rate),
        format!("EEPROM: {} bytes", profile.eeprom_size),
    ];
    if profile.features.wifi {
        lines.push(format!("MAC: {}", board.wifi_status().mac));
    }
    lines.join("\n")
}

pub fn memory<B: Board + ?Sized>(board: &B) -> String {
    let memory = board.memory();
    let mut lines = vec![
        format!("Free memory: {} bytes", memory.free),
        format!("Total memory: {} bytes", memory.total),
    ];
    if let Some(min_free) = memory.min_free {
        lines.push(format!("Min free: {} bytes", min_free));
    }
    if let Some(psram) = memory.psram_free {
        lines.push(format!("PSRAM free: {} bytes", psram));
    }
    lines.join("\n")
}

pub fn uptime<B: Board + ?Sized>(board: &B) -> String {
    format!("Uptime: {}", format_uptime(board.millis()))
}
