//! The board's command table.

use mcucon_board::{BoardProfile, Features};
use mcucon_protocol::Verb;

/// Help entry for one verb: (syntax, description) lines.
fn briefs(verb: Verb) -> &'static [(&'static str, &'static str)] {
    match verb {
        Verb::Help => &[("help", "Show this help")],
        Verb::Status => &[("status", "Board status summary")],
        Verb::Info => &[("info", "Chip and firmware details")],
        Verb::Memory => &[("memory", "Free and total memory")],
        Verb::Uptime => &[("uptime", "Time since boot")],
        Verb::Restart => &[("reset | restart", "Restart the board")],
        Verb::Led => &[
            ("led", "Show LED state"),
            ("led on | led off", "Switch the LED"),
        ],
        Verb::Blink => &[("blink", "Blink the LED")],
        Verb::Pins => &[("pins | gpio", "Read digital pin levels")],
        Verb::Analog => &[("analog", "Read analog inputs")],
        Verb::Temp => &[("temp", "Read the temperature sensor")],
        Verb::Pwm => &[("pwm <pin> <value>", "Set PWM duty (0-255)")],
        Verb::Tone => &[("tone <pin> <freq>", "Play a tone (31-65535 Hz)")],
        Verb::NoTone => &[("notone <pin>", "Stop a tone")],
        Verb::Gpio => &[("gpio <pin> <value>", "Drive an output pin (0 = LOW)")],
        Verb::Eeprom => &[
            ("eeprom read <addr>", "Read a stored byte"),
            ("eeprom write <addr> <value>", "Store a byte"),
        ],
        Verb::Scan => &[("scan", "Scan the I2C bus")],
        Verb::Wifi => &[
            ("wifi", "WiFi status"),
            ("wifi scan", "List visible networks"),
            ("wifi connect <ssid> [password]", "Join a network"),
        ],
        Verb::Camera => &[("camera", "Camera status")],
        Verb::Capture => &[("capture", "Capture a frame")],
        Verb::Bluetooth => &[("bluetooth", "Bluetooth status")],
    }
}

/// Whether `verb` needs an optional peripheral the board lacks.
fn requires_missing_feature(verb: Verb, features: &Features) -> bool {
    match verb {
        Verb::Wifi => !features.wifi,
        Verb::Camera | Verb::Capture => !features.camera,
        Verb::Bluetooth => !features.bluetooth,
        _ => false,
    }
}

/// Verbs registered for one board. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct CommandTable {
    board_name: &'static str,
    verbs: Vec<Verb>,
}

impl CommandTable {
    /// Register every verb the board's peripherals support.
    pub fn for_profile(profile: &BoardProfile) -> Self {
        let verbs = Verb::ALL
            .iter()
            .copied()
            .filter(|v| !requires_missing_feature(*v, &profile.features))
            .collect();
        CommandTable {
            board_name: profile.name,
            verbs,
        }
    }

    /// Whether `verb` is registered.
    pub fn supports(&self, verb: Verb) -> bool {
        self.verbs.contains(&verb)
    }

    /// Registered verbs in help order.
    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }

    /// Render the `help` response. `blink_count` is the configured number
    /// of `blink` toggles.
    pub fn help_text(&self, blink_count: u32) -> String {
        let entries: Vec<(&str, String)> = self
            .verbs
            .iter()
            .flat_map(|&verb| {
                briefs(verb).iter().map(move |&(syntax, description)| match verb {
                    Verb::Blink => (syntax, format!("{description} {blink_count} times")),
                    _ => (syntax, description.to_string()),
                })
            })
            .collect();
        let width = entries.iter().map(|(syntax, _)| syntax.len()).max().unwrap_or(0);

        let mut out = format!("{} commands:", self.board_name);
        for (syntax, description) in entries {
            out.push_str(&format!("\n  {:<width$}  {}", syntax, description, width = width));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcucon_board::BoardKind;

    #[test]
    fn test_uno_has_no_board_specific_verbs() {
        let table = CommandTable::for_profile(BoardKind::Uno.profile());
        assert!(table.supports(Verb::Pwm));
        assert!(!table.supports(Verb::Wifi));
        assert!(!table.supports(Verb::Camera));
        assert!(!table.supports(Verb::Bluetooth));
    }

    #[test]
    fn test_bluetooth_variant() {
        let table = CommandTable::for_profile(BoardKind::UnoBluetooth.profile());
        assert!(table.supports(Verb::Bluetooth));
        assert!(!table.supports(Verb::Capture));
    }

    #[test]
    fn test_esp32_cam_has_everything() {
        let table = CommandTable::for_profile(BoardKind::Esp32Cam.profile());
        assert_eq!(table.verbs().len(), Verb::ALL.len());
    }

    #[test]
    fn test_help_lists_registered_only() {
        let help = CommandTable::for_profile(BoardKind::Uno.profile()).help_text(5);
        assert!(help.starts_with("Arduino Uno commands:"));
        assert!(help.contains("Blink the LED 5 times"));
        assert!(help.contains("eeprom write <addr> <value>"));
        assert!(!help.contains("wifi"));
    }

    #[test]
    fn test_help_uses_configured_blink_count() {
        let help = CommandTable::for_profile(BoardKind::Uno.profile()).help_text(3);
        assert!(help.contains("Blink the LED 3 times"));
        assert!(!help.contains("5 times"));
    }
}
