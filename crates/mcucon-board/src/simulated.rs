//! An in-memory board used by tests and the host runner.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{BoardError, BoardResult};
use crate::hal::{
    BluetoothStatus, Board, CameraStatus, ChipInfo, Frame, MemoryStats, NetworkInfo, ProbeResult,
    WifiStatus,
};
use crate::profile::{BoardKind, BoardProfile};

// ============================================================================
// Configuration
// ============================================================================

/// A network the simulated radio can see.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedNetwork {
    pub ssid: String,
    /// Signal strength in dBm.
    #[serde(default = "default_rssi")]
    pub rssi: i32,
    /// Passphrase; `None` for an open network.
    #[serde(default)]
    pub password: Option<String>,
}

fn default_rssi() -> i32 {
    -60
}

/// Simulated camera sensor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedCamera {
    /// Whether the sensor initializes at boot.
    pub present: bool,
    pub sensor: String,
    pub width: u16,
    pub height: u16,
    pub quality: u8,
    /// Size of each synthesized JPEG payload.
    pub frame_bytes: usize,
    /// Fail every capture after this many frames.
    pub fail_after: Option<u64>,
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        SimulatedCamera {
            present: true,
            sensor: "OV2640".to_string(),
            width: 800,
            height: 600,
            quality: 12,
            frame_bytes: 4096,
            fail_after: None,
        }
    }
}

/// Configuration for [`SimulatedBoard`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedBoardConfig {
    /// Seed for analog noise and frame contents.
    pub rng_seed: u64,
    /// Track wall-clock time and really sleep in delays. When false, time only
    /// moves through `delay_ms`.
    pub realtime: bool,
    /// I2C addresses that acknowledge.
    pub i2c_devices: Vec<u8>,
    /// I2C addresses where the bus reports a fault.
    pub i2c_faults: Vec<u8>,
    /// Fixed analog levels by pin; other pins read mid-scale.
    pub analog_levels: BTreeMap<u8, u16>,
    /// Maximum jitter added to analog reads.
    pub analog_noise: u16,
    pub temperature_c: Option<f32>,
    pub networks: Vec<SimulatedNetwork>,
    /// Polls before a valid association completes.
    pub association_polls: u32,
    pub camera: SimulatedCamera,
    pub bluetooth_name: String,
    pub mac: String,
}

impl Default for SimulatedBoardConfig {
    fn default() -> Self {
        SimulatedBoardConfig {
            rng_seed: 12345,
            realtime: false,
            i2c_devices: Vec::new(),
            i2c_faults: Vec::new(),
            analog_levels: BTreeMap::new(),
            analog_noise: 0,
            temperature_c: Some(25.0),
            networks: Vec::new(),
            association_polls: 3,
            camera: SimulatedCamera::default(),
            bluetooth_name: "mcucon".to_string(),
            mac: "24:6F:28:00:00:01".to_string(),
        }
    }
}

// ============================================================================
// Simulated State
// ============================================================================

/// Observable state of one simulated pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PinState {
    pub level: bool,
    pub pwm: Option<u8>,
    pub tone: Option<u16>,
}

#[derive(Debug)]
enum Clock {
    Virtual { now_ms: u64 },
    Wall { boot: Instant },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum WifiState {
    Idle,
    /// `polls_left` is `None` when association can never succeed.
    Associating { ssid: String, polls_left: Option<u32> },
    Connected { ssid: String, rssi: i32, ip: String },
}

/// A deterministic software board.
pub struct SimulatedBoard {
    profile: &'static BoardProfile,
    config: SimulatedBoardConfig,
    clock: Clock,
    rng: ChaCha8Rng,
    pins: HashMap<u8, PinState>,
    /// Store contents as seen by reads.
    eeprom: Vec<u8>,
    /// Store contents that survive a restart.
    eeprom_flash: Vec<u8>,
    wifi: WifiState,
    bluetooth_client: bool,
    frames_captured: u64,
    restarts: u32,
    commits: u32,
    hardware_writes: u64,
}

impl SimulatedBoard {
    /// Create a board of the given variant.
    pub fn new(kind: BoardKind, config: SimulatedBoardConfig) -> Self {
        let profile = kind.profile();
        let clock = if config.realtime {
            Clock::Wall {
                boot: Instant::now(),
            }
        } else {
            Clock::Virtual { now_ms: 0 }
        };
        SimulatedBoard {
            profile,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
            clock,
            pins: HashMap::new(),
            // Erased EEPROM cells read 0xFF
            eeprom: vec![0xFF; profile.eeprom_size],
            eeprom_flash: vec![0xFF; profile.eeprom_size],
            wifi: WifiState::Idle,
            bluetooth_client: false,
            frames_captured: 0,
            restarts: 0,
            commits: 0,
            hardware_writes: 0,
        }
    }

    /// State of a pin as last driven.
    pub fn pin_state(&self, pin: u8) -> PinState {
        self.pins.get(&pin).copied().unwrap_or_default()
    }

    /// Drive an input pin from outside, as a wired signal would.
    pub fn set_input_level(&mut self, pin: u8, high: bool) {
        self.pins.entry(pin).or_default().level = high;
    }

    /// Mark whether a Bluetooth client is attached.
    pub fn set_bluetooth_client(&mut self, connected: bool) {
        self.bluetooth_client = connected;
    }

    /// Advance virtual time without a delay call.
    pub fn advance_ms(&mut self, ms: u64) {
        if let Clock::Virtual { now_ms } = &mut self.clock {
            *now_ms += ms;
        }
    }

    /// Number of restarts requested.
    pub fn restart_count(&self) -> u32 {
        self.restarts
    }

    /// Number of store commits.
    pub fn eeprom_commits(&self) -> u32 {
        self.commits
    }

    /// Count of every mutating hardware operation performed so far.
    pub fn hardware_writes(&self) -> u64 {
        self.hardware_writes
    }

    /// Number of frames handed out by the camera.
    pub fn frames_captured(&self) -> u64 {
        self.frames_captured
    }

    fn pin_mut(&mut self, pin: u8) -> &mut PinState {
        self.hardware_writes += 1;
        self.pins.entry(pin).or_default()
    }

    fn check_addr(&self, addr: usize) -> BoardResult<()> {
        if addr >= self.eeprom.len() {
            return Err(BoardError::AddressOutOfRange {
                addr,
                size: self.eeprom.len(),
            });
        }
        Ok(())
    }

    fn camera_ready(&self) -> bool {
        self.profile.features.camera && self.config.camera.present
    }

    fn synthesize_frame(&mut self) -> Frame {
        let payload_len = self.config.camera.frame_bytes;
        let mut data = Vec::with_capacity(payload_len + 6);
        // SOI + APP0 marker, payload, EOI
        data.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xE0]);
        let start = data.len();
        data.resize(start + payload_len, 0);
        self.rng.fill_bytes(&mut data[start..]);
        data.extend_from_slice(&[0xFF, 0xD9]);
        Frame {
            width: self.config.camera.width,
            height: self.config.camera.height,
            data,
        }
    }
}

impl Board for SimulatedBoard {
    fn profile(&self) -> &'static BoardProfile {
        self.profile
    }

    fn millis(&self) -> u64 {
        match &self.clock {
            Clock::Virtual { now_ms } => *now_ms,
            Clock::Wall { boot } => boot.elapsed().as_millis() as u64,
        }
    }

    fn delay_ms(&mut self, ms: u64) {
        match &mut self.clock {
            Clock::Virtual { now_ms } => *now_ms += ms,
            Clock::Wall { .. } => std::thread::sleep(Duration::from_millis(ms)),
        }
    }

    fn memory(&self) -> MemoryStats {
        match self.profile.kind {
            BoardKind::Uno | BoardKind::UnoBluetooth => MemoryStats {
                free: 1484,
                total: 2048,
                min_free: None,
                psram_free: None,
            },
            BoardKind::Esp32Cam => {
                let frame_buffers = if self.camera_ready() { 2 * 153_600 } else { 0 };
                MemoryStats {
                    free: 248_312,
                    total: 327_680,
                    min_free: Some(231_928),
                    psram_free: Some(4_194_252 - frame_buffers),
                }
            }
        }
    }

    fn chip(&self) -> ChipInfo {
        match self.profile.kind {
            BoardKind::Uno | BoardKind::UnoBluetooth => ChipInfo {
                model: "ATmega328P".to_string(),
                cores: 1,
                cpu_mhz: 16,
                flash_bytes: 32_768,
                sdk_version: "avr-core 1.8.6".to_string(),
            },
            BoardKind::Esp32Cam => ChipInfo {
                model: "ESP32-D0WDQ6".to_string(),
                cores: 2,
                cpu_mhz: 240,
                flash_bytes: 4 * 1024 * 1024,
                sdk_version: "v4.4.7".to_string(),
            },
        }
    }

    fn restart(&mut self) {
        log::info!("simulated {} restarting", self.profile.name);
        self.restarts += 1;
        self.clock = match self.clock {
            Clock::Virtual { .. } => Clock::Virtual { now_ms: 0 },
            Clock::Wall { .. } => Clock::Wall {
                boot: Instant::now(),
            },
        };
        self.pins.clear();
        self.wifi = WifiState::Idle;
        // Uncommitted writes are lost
        self.eeprom.clone_from(&self.eeprom_flash);
    }

    fn digital_write(&mut self, pin: u8, high: bool) {
        log::trace!("digital_write pin={} high={}", pin, high);
        let state = self.pin_mut(pin);
        state.level = high;
        state.pwm = None;
    }

    fn digital_read(&mut self, pin: u8) -> bool {
        self.pin_state(pin).level
    }

    fn analog_read(&mut self, pin: u8) -> u16 {
        let max = self.profile.adc_max;
        let base = self
            .config
            .analog_levels
            .get(&pin)
            .copied()
            .unwrap_or(max / 2)
            .min(max);
        let noise = i32::from(self.config.analog_noise);
        let jitter = if noise > 0 {
            self.rng.gen_range(-noise..=noise)
        } else {
            0
        };
        (i32::from(base) + jitter).clamp(0, i32::from(max)) as u16
    }

    fn pwm_write(&mut self, pin: u8, duty: u8) {
        log::trace!("pwm_write pin={} duty={}", pin, duty);
        let state = self.pin_mut(pin);
        state.pwm = Some(duty);
        state.level = duty > 0;
    }

    fn tone(&mut self, pin: u8, freq: u16) {
        self.pin_mut(pin).tone = Some(freq);
    }

    fn no_tone(&mut self, pin: u8) {
        let state = self.pin_mut(pin);
        state.tone = None;
        state.level = false;
    }

    fn temperature_c(&mut self) -> Option<f32> {
        self.config.temperature_c
    }

    fn eeprom_read(&mut self, addr: usize) -> BoardResult<u8> {
        self.check_addr(addr)?;
        Ok(self.eeprom[addr])
    }

    fn eeprom_write(&mut self, addr: usize, value: u8) -> BoardResult<()> {
        self.check_addr(addr)?;
        self.hardware_writes += 1;
        self.eeprom[addr] = value;
        if !self.profile.eeprom_needs_commit {
            self.eeprom_flash[addr] = value;
        }
        Ok(())
    }

    fn eeprom_commit(&mut self) -> BoardResult<()> {
        self.commits += 1;
        self.eeprom_flash.clone_from(&self.eeprom);
        Ok(())
    }

    fn i2c_probe(&mut self, addr: u8) -> ProbeResult {
        if self.config.i2c_faults.contains(&addr) {
            ProbeResult::Error
        } else if self.config.i2c_devices.contains(&addr) {
            ProbeResult::Ack
        } else {
            ProbeResult::Nack
        }
    }

    fn wifi_status(&self) -> WifiStatus {
        let mac = self.config.mac.clone();
        match &self.wifi {
            WifiState::Connected { ssid, rssi, ip } => WifiStatus {
                connected: true,
                ssid: Some(ssid.clone()),
                ip: Some(ip.clone()),
                rssi: Some(*rssi),
                mac,
            },
            _ => WifiStatus {
                connected: false,
                ssid: None,
                ip: None,
                rssi: None,
                mac,
            },
        }
    }

    fn wifi_scan(&mut self) -> BoardResult<Vec<NetworkInfo>> {
        if !self.profile.features.wifi {
            return Err(BoardError::Unsupported("WiFi"));
        }
        let mut networks: Vec<NetworkInfo> = self
            .config
            .networks
            .iter()
            .map(|n| NetworkInfo {
                ssid: n.ssid.clone(),
                rssi: n.rssi,
                secured: n.password.is_some(),
            })
            .collect();
        networks.sort_by(|a, b| b.rssi.cmp(&a.rssi));
        Ok(networks)
    }

    fn wifi_begin(&mut self, ssid: &str, password: Option<&str>) -> BoardResult<()> {
        if !self.profile.features.wifi {
            return Err(BoardError::Unsupported("WiFi"));
        }
        let accepted = self
            .config
            .networks
            .iter()
            .any(|n| n.ssid == ssid && n.password.as_deref() == password);
        self.hardware_writes += 1;
        self.wifi = WifiState::Associating {
            ssid: ssid.to_string(),
            polls_left: accepted.then_some(self.config.association_polls),
        };
        Ok(())
    }

    fn wifi_poll(&mut self) -> bool {
        let next = match &self.wifi {
            WifiState::Connected { .. } => return true,
            WifiState::Idle => return false,
            WifiState::Associating { polls_left: None, .. } => return false,
            WifiState::Associating {
                ssid,
                polls_left: Some(n),
            } => {
                if *n <= 1 {
                    let index = self
                        .config
                        .networks
                        .iter()
                        .position(|net| &net.ssid == ssid)
                        .unwrap_or(0);
                    let rssi = self.config.networks.get(index).map_or(-60, |net| net.rssi);
                    WifiState::Connected {
                        ssid: ssid.clone(),
                        rssi,
                        ip: format!("192.168.4.{}", 100 + index),
                    }
                } else {
                    WifiState::Associating {
                        ssid: ssid.clone(),
                        polls_left: Some(n - 1),
                    }
                }
            }
        };
        self.wifi = next;
        matches!(self.wifi, WifiState::Connected { .. })
    }

    fn camera_status(&self) -> CameraStatus {
        let cam = &self.config.camera;
        CameraStatus {
            initialized: self.camera_ready(),
            sensor: cam.sensor.clone(),
            width: cam.width,
            height: cam.height,
            quality: cam.quality,
        }
    }

    fn camera_capture(&mut self) -> BoardResult<Frame> {
        if !self.camera_ready() {
            return Err(BoardError::CameraNotInitialized);
        }
        if let Some(limit) = self.config.camera.fail_after {
            if self.frames_captured >= limit {
                return Err(BoardError::CaptureFailed);
            }
        }
        self.frames_captured += 1;
        Ok(self.synthesize_frame())
    }

    fn bluetooth_status(&self) -> BluetoothStatus {
        BluetoothStatus {
            enabled: self.profile.features.bluetooth,
            device_name: self.config.bluetooth_name.clone(),
            client_connected: self.profile.features.bluetooth && self.bluetooth_client,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uno() -> SimulatedBoard {
        SimulatedBoard::new(BoardKind::Uno, SimulatedBoardConfig::default())
    }

    fn cam(config: SimulatedBoardConfig) -> SimulatedBoard {
        SimulatedBoard::new(BoardKind::Esp32Cam, config)
    }

    #[test]
    fn test_eeprom_starts_erased() {
        let mut board = uno();
        assert_eq!(board.eeprom_read(0), Ok(0xFF));
        assert_eq!(board.eeprom_read(1023), Ok(0xFF));
    }

    #[test]
    fn test_eeprom_bounds() {
        let mut board = uno();
        assert_eq!(
            board.eeprom_read(1024),
            Err(BoardError::AddressOutOfRange { addr: 1024, size: 1024 })
        );
        assert!(board.eeprom_write(5000, 1).is_err());
        assert_eq!(board.hardware_writes(), 0);
    }

    #[test]
    fn test_uncommitted_writes_lost_on_restart() {
        let mut board = cam(SimulatedBoardConfig::default());
        board.eeprom_write(3, 9).unwrap();
        assert_eq!(board.eeprom_read(3), Ok(9));
        board.restart();
        assert_eq!(board.eeprom_read(3), Ok(0xFF));

        board.eeprom_write(3, 9).unwrap();
        board.eeprom_commit().unwrap();
        board.restart();
        assert_eq!(board.eeprom_read(3), Ok(9));
    }

    #[test]
    fn test_uno_writes_persist_without_commit() {
        let mut board = uno();
        board.eeprom_write(7, 1).unwrap();
        board.restart();
        assert_eq!(board.eeprom_read(7), Ok(1));
    }

    #[test]
    fn test_virtual_clock() {
        let mut board = uno();
        assert_eq!(board.millis(), 0);
        board.delay_ms(250);
        board.advance_ms(750);
        assert_eq!(board.millis(), 1000);
        board.restart();
        assert_eq!(board.millis(), 0);
        assert_eq!(board.restart_count(), 1);
    }

    #[test]
    fn test_pin_writes() {
        let mut board = uno();
        board.pwm_write(9, 128);
        assert_eq!(board.pin_state(9).pwm, Some(128));
        board.digital_write(9, false);
        assert_eq!(board.pin_state(9), PinState::default());
        board.tone(8, 440);
        assert_eq!(board.pin_state(8).tone, Some(440));
        board.no_tone(8);
        assert_eq!(board.pin_state(8).tone, None);
    }

    #[test]
    fn test_analog_fixed_level() {
        let mut config = SimulatedBoardConfig::default();
        config.analog_levels.insert(14, 700);
        let mut board = SimulatedBoard::new(BoardKind::Uno, config);
        assert_eq!(board.analog_read(14), 700);
        assert_eq!(board.analog_read(15), 511);
    }

    #[test]
    fn test_analog_noise_stays_in_range() {
        let mut config = SimulatedBoardConfig::default();
        config.analog_levels.insert(14, 1020);
        config.analog_noise = 50;
        let mut board = SimulatedBoard::new(BoardKind::Uno, config);
        for _ in 0..100 {
            let v = board.analog_read(14);
            assert!((970..=1023).contains(&v));
        }
    }

    #[test]
    fn test_i2c_probe() {
        let config = SimulatedBoardConfig {
            i2c_devices: vec![0x3C],
            i2c_faults: vec![0x50],
            ..Default::default()
        };
        let mut board = SimulatedBoard::new(BoardKind::Uno, config);
        assert_eq!(board.i2c_probe(0x3C), ProbeResult::Ack);
        assert_eq!(board.i2c_probe(0x50), ProbeResult::Error);
        assert_eq!(board.i2c_probe(0x10), ProbeResult::Nack);
    }

    #[test]
    fn test_wifi_association() {
        let config = SimulatedBoardConfig {
            networks: vec![SimulatedNetwork {
                ssid: "HomeNet".to_string(),
                rssi: -48,
                password: Some("S3cret".to_string()),
            }],
            association_polls: 2,
            ..Default::default()
        };
        let mut board = cam(config);
        board.wifi_begin("HomeNet", Some("S3cret")).unwrap();
        assert!(!board.wifi_poll());
        assert!(board.wifi_poll());
        let status = board.wifi_status();
        assert!(status.connected);
        assert_eq!(status.ip.as_deref(), Some("192.168.4.100"));
        assert_eq!(status.rssi, Some(-48));
    }

    #[test]
    fn test_wifi_wrong_password_never_connects() {
        let config = SimulatedBoardConfig {
            networks: vec![SimulatedNetwork {
                ssid: "HomeNet".to_string(),
                rssi: -48,
                password: Some("S3cret".to_string()),
            }],
            ..Default::default()
        };
        let mut board = cam(config);
        board.wifi_begin("HomeNet", Some("s3cret")).unwrap();
        for _ in 0..50 {
            assert!(!board.wifi_poll());
        }
    }

    #[test]
    fn test_wifi_unsupported_on_uno() {
        let mut board = uno();
        assert_eq!(board.wifi_scan(), Err(BoardError::Unsupported("WiFi")));
    }

    #[test]
    fn test_camera_capture() {
        let mut board = cam(SimulatedBoardConfig::default());
        let frame = board.camera_capture().unwrap();
        assert_eq!(&frame.data[..2], &[0xFF, 0xD8]);
        assert_eq!(&frame.data[frame.len() - 2..], &[0xFF, 0xD9]);
        assert_eq!(frame.len(), 4096 + 6);
    }

    #[test]
    fn test_camera_absent() {
        let mut config = SimulatedBoardConfig::default();
        config.camera.present = false;
        let mut board = cam(config);
        assert!(!board.camera_status().initialized);
        assert_eq!(board.camera_capture(), Err(BoardError::CameraNotInitialized));
    }

    #[test]
    fn test_camera_fail_after() {
        let mut config = SimulatedBoardConfig::default();
        config.camera.fail_after = Some(1);
        let mut board = cam(config);
        assert!(board.camera_capture().is_ok());
        assert_eq!(board.camera_capture(), Err(BoardError::CaptureFailed));
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
i2c_devices: [0x3C, 0x68]
networks:
  - ssid: Lab
    password: hunter2
camera:
  present: false
"#;
        let config: SimulatedBoardConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.i2c_devices, vec![0x3C, 0x68]);
        assert_eq!(config.networks[0].rssi, -60);
        assert!(!config.camera.present);
        assert_eq!(config.camera.width, 800);
        assert_eq!(config.association_polls, 3);
    }
}
