//! The hardware abstraction the console drives.

use serde::Serialize;

use crate::error::BoardResult;
use crate::profile::BoardProfile;

// ============================================================================
// Peripheral Data Types
// ============================================================================

/// Memory usage snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    /// Free RAM/heap in bytes.
    pub free: u32,
    /// Total RAM/heap in bytes.
    pub total: u32,
    /// Lowest free heap since boot, where the platform tracks it.
    pub min_free: Option<u32>,
    /// Free external PSRAM, where fitted.
    pub psram_free: Option<u32>,
}

/// Static chip details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChipInfo {
    pub model: String,
    pub cores: u8,
    pub cpu_mhz: u32,
    pub flash_bytes: u32,
    pub sdk_version: String,
}

/// Outcome of addressing one I2C device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    /// The device acknowledged its address.
    Ack,
    /// Nobody answered.
    Nack,
    /// The bus reported a fault at this address.
    Error,
}

/// A network seen by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkInfo {
    pub ssid: String,
    /// Signal strength in dBm.
    pub rssi: i32,
    pub secured: bool,
}

/// WiFi association state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WifiStatus {
    pub connected: bool,
    pub ssid: Option<String>,
    pub ip: Option<String>,
    pub rssi: Option<i32>,
    pub mac: String,
}

/// Camera sensor state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CameraStatus {
    pub initialized: bool,
    pub sensor: String,
    pub width: u16,
    pub height: u16,
    /// JPEG quality (lower is better).
    pub quality: u8,
}

/// A captured JPEG frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    pub data: Vec<u8>,
}

impl Frame {
    /// Size of the encoded frame in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the frame holds no data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Bluetooth serial state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BluetoothStatus {
    pub enabled: bool,
    pub device_name: String,
    #[serde(rename = "connected")]
    pub client_connected: bool,
}

// ============================================================================
// Board Trait
// ============================================================================

/// Narrow peripheral operations.
///
/// Reads always query the hardware; nothing is cached by callers. Each write
/// method performs exactly one hardware write.
pub trait Board {
    /// Static wiring of this board.
    fn profile(&self) -> &'static BoardProfile;

    // ---- system ----

    /// Milliseconds since boot.
    fn millis(&self) -> u64;

    /// Block for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u64);

    /// Current memory usage.
    fn memory(&self) -> MemoryStats;

    /// Chip details.
    fn chip(&self) -> ChipInfo;

    /// Reboot the board. On hardware this does not return.
    fn restart(&mut self);

    // ---- pins ----

    /// Configure `pin` as an output and drive it.
    fn digital_write(&mut self, pin: u8, high: bool);

    /// Read the level of `pin`.
    fn digital_read(&mut self, pin: u8) -> bool;

    /// Raw ADC reading.
    fn analog_read(&mut self, pin: u8) -> u16;

    /// Set a PWM duty value.
    fn pwm_write(&mut self, pin: u8, duty: u8);

    /// Start a square wave.
    fn tone(&mut self, pin: u8, freq: u16);

    /// Stop a square wave.
    fn no_tone(&mut self, pin: u8);

    /// Chip temperature in degrees Celsius, if the board has a sensor.
    fn temperature_c(&mut self) -> Option<f32>;

    // ---- non-volatile store ----

    /// Read one byte.
    fn eeprom_read(&mut self, addr: usize) -> BoardResult<u8>;

    /// Write one byte.
    fn eeprom_write(&mut self, addr: usize, value: u8) -> BoardResult<()>;

    /// Flush pending writes to flash.
    fn eeprom_commit(&mut self) -> BoardResult<()>;

    // ---- I2C ----

    /// Address one device and report whether it answered.
    fn i2c_probe(&mut self, addr: u8) -> ProbeResult;

    // ---- WiFi ----

    fn wifi_status(&self) -> WifiStatus;

    fn wifi_scan(&mut self) -> BoardResult<Vec<NetworkInfo>>;

    /// Start associating with a network.
    fn wifi_begin(&mut self, ssid: &str, password: Option<&str>) -> BoardResult<()>;

    /// Check whether association has completed.
    fn wifi_poll(&mut self) -> bool;

    // ---- camera ----

    fn camera_status(&self) -> CameraStatus;

    /// Grab one frame.
    fn camera_capture(&mut self) -> BoardResult<Frame>;

    // ---- Bluetooth ----

    fn bluetooth_status(&self) -> BluetoothStatus;
}
