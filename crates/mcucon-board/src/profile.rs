//! Static descriptions of the supported firmware variants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// Board Kind
// ============================================================================

/// The firmware variants the console is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoardKind {
    /// 8-bit board, wired serial only.
    Uno,
    /// 8-bit board with an HC-05 style module on a software serial port.
    UnoBluetooth,
    /// WiFi/camera board with built-in Bluetooth serial.
    Esp32Cam,
}

impl BoardKind {
    /// Get the variant name used in config files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            BoardKind::Uno => "uno",
            BoardKind::UnoBluetooth => "uno-bluetooth",
            BoardKind::Esp32Cam => "esp32-cam",
        }
    }

    /// Get the static profile for this variant.
    pub fn profile(&self) -> &'static BoardProfile {
        match self {
            BoardKind::Uno => &UNO,
            BoardKind::UnoBluetooth => &UNO_BLUETOOTH,
            BoardKind::Esp32Cam => &ESP32_CAM,
        }
    }
}

impl fmt::Display for BoardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoardKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uno" => Ok(BoardKind::Uno),
            "uno-bluetooth" | "uno-bt" => Ok(BoardKind::UnoBluetooth),
            "esp32-cam" | "esp32cam" | "esp32" => Ok(BoardKind::Esp32Cam),
            other => Err(format!(
                "unknown board '{}' (expected uno, uno-bluetooth or esp32-cam)",
                other
            )),
        }
    }
}

// ============================================================================
// Profile
// ============================================================================

/// Optional peripherals present on a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Features {
    pub wifi: bool,
    pub camera: bool,
    pub bluetooth: bool,
}

/// A pin taken over by a transport channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservedPin {
    /// Pin number.
    pub pin: u8,
    /// What the pin is used for, shown in rejections.
    pub purpose: &'static str,
}

/// An analog input and the label it is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalogInput {
    pub label: &'static str,
    pub pin: u8,
}

/// Everything the console needs to know about a variant's wiring.
#[derive(Debug)]
pub struct BoardProfile {
    pub kind: BoardKind,
    /// Human-readable board name.
    pub name: &'static str,
    /// Serial bit rate.
    pub baud_rate: u32,
    /// Non-volatile store capacity in bytes.
    pub eeprom_size: usize,
    /// Whether byte writes must be followed by an explicit commit.
    pub eeprom_needs_commit: bool,
    /// The on-board LED.
    pub led_pin: u8,
    /// Pins wired to PWM hardware, before reservations.
    pub pwm_pins: &'static [u8],
    /// User-assignable output pins, before reservations.
    pub gpio_pins: &'static [u8],
    /// Pins listed by `pins`.
    pub digital_pins: &'static [u8],
    /// Prefix used when naming digital pins ("D" gives "D13").
    pub pin_prefix: &'static str,
    /// Pins occupied by a transport.
    pub reserved_pins: &'static [ReservedPin],
    pub analog_inputs: &'static [AnalogInput],
    /// Largest ADC reading.
    pub adc_max: u16,
    /// ADC reference voltage.
    pub adc_vref: f32,
    pub features: Features,
}

/// The 8-bit board.
pub static UNO: BoardProfile = BoardProfile {
    kind: BoardKind::Uno,
    name: "Arduino Uno",
    baud_rate: 9600,
    eeprom_size: 1024,
    eeprom_needs_commit: false,
    led_pin: 13,
    pwm_pins: &[3, 5, 6, 9, 10, 11],
    gpio_pins: &[2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12],
    digital_pins: &[2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13],
    pin_prefix: "D",
    reserved_pins: &[],
    analog_inputs: &UNO_ANALOG,
    adc_max: 1023,
    adc_vref: 5.0,
    features: Features {
        wifi: false,
        camera: false,
        bluetooth: false,
    },
};

/// The 8-bit board with a Bluetooth module on pins 10/11.
pub static UNO_BLUETOOTH: BoardProfile = BoardProfile {
    kind: BoardKind::UnoBluetooth,
    name: "Arduino Uno + HC-05",
    baud_rate: 9600,
    eeprom_size: 1024,
    eeprom_needs_commit: false,
    led_pin: 13,
    pwm_pins: &[3, 5, 6, 9, 10, 11],
    gpio_pins: &[2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12],
    digital_pins: &[2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13],
    pin_prefix: "D",
    reserved_pins: &[
        ReservedPin {
            pin: 10,
            purpose: "Bluetooth RX",
        },
        ReservedPin {
            pin: 11,
            purpose: "Bluetooth TX",
        },
    ],
    analog_inputs: &UNO_ANALOG,
    adc_max: 1023,
    adc_vref: 5.0,
    features: Features {
        wifi: false,
        camera: false,
        bluetooth: true,
    },
};

/// The WiFi/camera board.
pub static ESP32_CAM: BoardProfile = BoardProfile {
    kind: BoardKind::Esp32Cam,
    name: "ESP32-CAM",
    baud_rate: 115_200,
    eeprom_size: 512,
    eeprom_needs_commit: true,
    led_pin: 4,
    pwm_pins: &[2, 4, 12, 13, 14, 15],
    gpio_pins: &[2, 4, 12, 13, 14, 15, 16],
    digital_pins: &[2, 4, 12, 13, 14, 15, 16],
    pin_prefix: "GPIO",
    reserved_pins: &[],
    analog_inputs: &[
        AnalogInput { label: "GPIO12", pin: 12 },
        AnalogInput { label: "GPIO13", pin: 13 },
        AnalogInput { label: "GPIO14", pin: 14 },
        AnalogInput { label: "GPIO15", pin: 15 },
    ],
    adc_max: 4095,
    adc_vref: 3.3,
    features: Features {
        wifi: true,
        camera: true,
        bluetooth: true,
    },
};

const UNO_ANALOG: [AnalogInput; 6] = [
    AnalogInput { label: "A0", pin: 14 },
    AnalogInput { label: "A1", pin: 15 },
    AnalogInput { label: "A2", pin: 16 },
    AnalogInput { label: "A3", pin: 17 },
    AnalogInput { label: "A4", pin: 18 },
    AnalogInput { label: "A5", pin: 19 },
];

impl BoardProfile {
    /// The reservation covering `pin`, if any.
    pub fn reservation(&self, pin: u8) -> Option<&ReservedPin> {
        self.reserved_pins.iter().find(|r| r.pin == pin)
    }

    /// Whether a transport occupies `pin`.
    pub fn is_reserved(&self, pin: u8) -> bool {
        self.reservation(pin).is_some()
    }

    /// PWM-capable pins that no transport occupies.
    pub fn pwm_allow_list(&self) -> Vec<u8> {
        self.pwm_pins
            .iter()
            .copied()
            .filter(|&p| !self.is_reserved(p))
            .collect()
    }

    /// Output pins that no transport occupies.
    pub fn gpio_allow_list(&self) -> Vec<u8> {
        self.gpio_pins
            .iter()
            .copied()
            .filter(|&p| !self.is_reserved(p))
            .collect()
    }

    /// Display name of a digital pin.
    pub fn pin_label(&self, pin: u8) -> String {
        format!("{}{}", self.pin_prefix, pin)
    }

    /// Convert a raw ADC reading to volts.
    pub fn adc_to_volts(&self, raw: u16) -> f32 {
        f32::from(raw) * self.adc_vref / f32::from(self.adc_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uno_allow_lists() {
        assert_eq!(UNO.pwm_allow_list(), vec![3, 5, 6, 9, 10, 11]);
        assert_eq!(UNO.gpio_allow_list().len(), 11);
        assert!(!UNO.is_reserved(10));
    }

    #[test]
    fn test_bluetooth_pins_are_excluded() {
        let profile = BoardKind::UnoBluetooth.profile();
        assert_eq!(profile.pwm_allow_list(), vec![3, 5, 6, 9]);
        assert_eq!(profile.gpio_allow_list(), vec![2, 3, 4, 5, 6, 7, 8, 9, 12]);
        assert_eq!(profile.reservation(11).map(|r| r.purpose), Some("Bluetooth TX"));
    }

    #[test]
    fn test_store_capacities() {
        assert_eq!(BoardKind::Uno.profile().eeprom_size, 1024);
        assert_eq!(BoardKind::Esp32Cam.profile().eeprom_size, 512);
        assert!(BoardKind::Esp32Cam.profile().eeprom_needs_commit);
    }

    #[test]
    fn test_bit_rates() {
        assert_eq!(BoardKind::Uno.profile().baud_rate, 9600);
        assert_eq!(BoardKind::Esp32Cam.profile().baud_rate, 115_200);
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("ESP32-CAM".parse::<BoardKind>(), Ok(BoardKind::Esp32Cam));
        assert_eq!("uno-bt".parse::<BoardKind>(), Ok(BoardKind::UnoBluetooth));
        assert!("mega".parse::<BoardKind>().is_err());
    }

    #[test]
    fn test_pin_labels() {
        assert_eq!(UNO.pin_label(13), "D13");
        assert_eq!(ESP32_CAM.pin_label(4), "GPIO4");
    }

    #[test]
    fn test_adc_to_volts() {
        let volts = UNO.adc_to_volts(1023);
        assert!((volts - 5.0).abs() < 1e-6);
        assert!(ESP32_CAM.adc_to_volts(0).abs() < 1e-6);
    }
}
