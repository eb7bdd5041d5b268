//! Enumerate boards attached to the host.
//!
//! Two sources are combined: serial device nodes under `/dev` whose names
//! match the usual USB-serial drivers, and (on macOS) the USB device tree
//! reported by `system_profiler`. Only the device node count decides whether
//! anything was found; the USB tree adds detail.

use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Device node name prefixes of USB-serial adapters.
pub const SERIAL_PORT_PREFIXES: &[&str] = &[
    "cu.usbserial",
    "cu.usbmodem",
    "cu.wchusbserial",
    "tty.usbserial",
    "tty.usbmodem",
    "tty.wchusbserial",
    "ttyUSB",
    "ttyACM",
];

/// USB vendor ids of common USB-serial bridges.
const KNOWN_VENDORS: &[(&str, &str)] = &[
    ("0x2341", "Arduino"),
    ("0x1a86", "CH340/CH341"),
    ("0x0403", "FTDI"),
    ("0x10c4", "Silicon Labs"),
    ("0x067b", "Prolific"),
];

/// Product name fragments that mark a serial adapter.
const NAME_HINTS: &[&str] = &["arduino", "serial", "ch340", "ftdi", "usb2.0-serial"];

const UNKNOWN: &str = "Unknown";

/// A USB device that looks like a board or serial bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsbDevice {
    pub name: String,
    pub vendor_id: String,
    pub product_id: String,
    pub version: String,
    pub speed: String,
    pub location_id: String,
    pub manufacturer: String,
    pub serial_number: Option<String>,
}

/// Everything `detect` found.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DetectionReport {
    pub serial_ports: Vec<PathBuf>,
    pub usb_devices: Vec<UsbDevice>,
}

/// Manufacturer for a `vendor_id` field such as `"0x2341  (Arduino SA)"`.
pub fn vendor_name(vendor_id: &str) -> Option<&'static str> {
    let id = vendor_id.split_whitespace().next()?.to_ascii_lowercase();
    KNOWN_VENDORS
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(_, name)| *name)
}

/// Serial device nodes in `dir` matching [`SERIAL_PORT_PREFIXES`], sorted.
pub fn serial_ports(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut ports = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if SERIAL_PORT_PREFIXES.iter().any(|p| name.starts_with(p)) {
            ports.push(entry.path());
        }
    }
    ports.sort();
    ports.dedup();
    Ok(ports)
}

/// Collect candidate devices from `system_profiler SPUSBDataType -json` output.
pub fn usb_devices_from_json(report: &Value) -> Vec<UsbDevice> {
    let mut found = Vec::new();
    if let Some(buses) = report.get("SPUSBDataType").and_then(Value::as_array) {
        for bus in buses {
            if let Some(items) = bus.get("_items").and_then(Value::as_array) {
                walk(items, &mut found);
            }
        }
    }
    found
}

fn walk(items: &[Value], found: &mut Vec<UsbDevice>) {
    for item in items {
        if let Some(device) = classify(item) {
            found.push(device);
        }
        if let Some(children) = item.get("_items").and_then(Value::as_array) {
            walk(children, found);
        }
    }
}

fn field<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key).and_then(Value::as_str)
}

fn classify(item: &Value) -> Option<UsbDevice> {
    let vendor_id = field(item, "vendor_id").unwrap_or_default();
    let name = field(item, "_name").unwrap_or_default();
    let lowered = name.to_lowercase();

    let manufacturer = vendor_name(vendor_id);
    if manufacturer.is_none() && !NAME_HINTS.iter().any(|hint| lowered.contains(hint)) {
        return None;
    }

    let text = |key: &str| field(item, key).unwrap_or(UNKNOWN).to_string();
    Some(UsbDevice {
        name: if name.is_empty() { UNKNOWN.to_string() } else { name.to_string() },
        vendor_id: text("vendor_id"),
        product_id: text("product_id"),
        version: text("bcd_device"),
        speed: text("speed"),
        location_id: text("location_id"),
        manufacturer: manufacturer.unwrap_or(UNKNOWN).to_string(),
        serial_number: field(item, "serial_num").map(str::to_string),
    })
}

/// Query the USB tree. Any failure is logged and yields no devices.
pub fn usb_devices() -> Vec<UsbDevice> {
    let output = match Command::new("system_profiler")
        .args(["SPUSBDataType", "-json"])
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            debug!("system_profiler unavailable: {}", e);
            return Vec::new();
        }
    };
    if !output.status.success() {
        warn!("system_profiler exited with {}", output.status);
        return Vec::new();
    }
    match serde_json::from_slice::<Value>(&output.stdout) {
        Ok(report) => usb_devices_from_json(&report),
        Err(e) => {
            warn!("Error parsing USB device info: {}", e);
            Vec::new()
        }
    }
}

/// Scan `/dev` and the USB tree.
pub fn detect() -> DetectionReport {
    let serial_ports = serial_ports(Path::new("/dev")).unwrap_or_else(|e| {
        warn!("Cannot list /dev: {}", e);
        Vec::new()
    });
    DetectionReport {
        serial_ports,
        usb_devices: usb_devices(),
    }
}

/// Human readable summary.
pub fn render(report: &DetectionReport) -> String {
    let mut out = String::new();
    if report.serial_ports.is_empty() {
        out.push_str("No boards found.\n");
        out.push_str("Check that the board is plugged in with a data-capable USB cable.\n");
        return out;
    }

    let _ = writeln!(out, "Found {} potential board(s)", report.serial_ports.len());
    let _ = writeln!(out, "\nSerial ports ({}):", report.serial_ports.len());
    for (i, port) in report.serial_ports.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, port.display());
    }

    if !report.usb_devices.is_empty() {
        let _ = writeln!(out, "\nUSB devices ({}):", report.usb_devices.len());
        for (i, device) in report.usb_devices.iter().enumerate() {
            let _ = writeln!(out, "\n  Device {}:", i + 1);
            let _ = writeln!(out, "    Name: {}", device.name);
            let _ = writeln!(out, "    Manufacturer: {}", device.manufacturer);
            let _ = writeln!(out, "    Vendor ID: {}", device.vendor_id);
            let _ = writeln!(out, "    Product ID: {}", device.product_id);
            let _ = writeln!(out, "    Version: {}", device.version);
            let _ = writeln!(out, "    Speed: {}", device.speed);
            let _ = writeln!(out, "    Location: {}", device.location_id);
            if let Some(serial) = &device.serial_number {
                let _ = writeln!(out, "    Serial Number: {}", serial);
            }
        }
    }

    // Call-out nodes are the ones an IDE should open
    let callout: Vec<&PathBuf> = report
        .serial_ports
        .iter()
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("cu."))
        })
        .collect();
    if !callout.is_empty() {
        out.push_str("\nUsage in an IDE:\n");
        out.push_str("  Select one of these ports under Tools > Port:\n");
        for port in callout {
            let _ = writeln!(out, "    {}", port.display());
        }
    }
    out
}
