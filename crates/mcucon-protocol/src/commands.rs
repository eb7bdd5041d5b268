//! Command grammar.
//!
//! A line is parsed exactly once into a [`Command`]. The grammar is a static
//! table of phrases; each phrase is either matched whole (`led on`) or as a
//! prefix followed by whitespace-separated arguments (`pwm 9 128`).
//!
//! Lookup rule: an exact phrase match wins; otherwise the longest prefix
//! phrase that the line equals or continues with a space; otherwise the line
//! is [`Command::Unknown`].

use std::fmt;

/// Command families, one per handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Help,
    Status,
    Info,
    Memory,
    Uptime,
    Restart,
    Led,
    Blink,
    Pins,
    Analog,
    Temp,
    Pwm,
    Tone,
    NoTone,
    Eeprom,
    Gpio,
    Scan,
    Wifi,
    Camera,
    Capture,
    Bluetooth,
}

impl Verb {
    /// Every verb, in help order.
    pub const ALL: [Verb; 21] = [
        Verb::Help,
        Verb::Status,
        Verb::Info,
        Verb::Memory,
        Verb::Uptime,
        Verb::Restart,
        Verb::Led,
        Verb::Blink,
        Verb::Pins,
        Verb::Analog,
        Verb::Temp,
        Verb::Pwm,
        Verb::Tone,
        Verb::NoTone,
        Verb::Eeprom,
        Verb::Gpio,
        Verb::Scan,
        Verb::Wifi,
        Verb::Camera,
        Verb::Capture,
        Verb::Bluetooth,
    ];

    /// Short name used in logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Help => "help",
            Verb::Status => "status",
            Verb::Info => "info",
            Verb::Memory => "memory",
            Verb::Uptime => "uptime",
            Verb::Restart => "restart",
            Verb::Led => "led",
            Verb::Blink => "blink",
            Verb::Pins => "pins",
            Verb::Analog => "analog",
            Verb::Temp => "temp",
            Verb::Pwm => "pwm",
            Verb::Tone => "tone",
            Verb::NoTone => "notone",
            Verb::Eeprom => "eeprom",
            Verb::Gpio => "gpio",
            Verb::Scan => "scan",
            Verb::Wifi => "wifi",
            Verb::Camera => "camera",
            Verb::Capture => "capture",
            Verb::Bluetooth => "bluetooth",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Malformed invocations of a variadic command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    Pwm,
    Tone,
    NoTone,
    Eeprom,
    Gpio,
    WifiConnect,
}

impl Usage {
    /// The usage line shown to the operator.
    pub fn text(&self) -> &'static str {
        match self {
            Usage::Pwm => "Usage: pwm <pin> <value>",
            Usage::Tone => "Usage: tone <pin> <frequency>",
            Usage::NoTone => "Usage: notone <pin>",
            Usage::Eeprom => "Usage: eeprom read <addr> | eeprom write <addr> <value>",
            Usage::Gpio => "Usage: gpio <pin> <value>",
            Usage::WifiConnect => "Usage: wifi connect <ssid> [password]",
        }
    }

    /// The command family this usage belongs to.
    pub fn verb(&self) -> Verb {
        match self {
            Usage::Pwm => Verb::Pwm,
            Usage::Tone => Verb::Tone,
            Usage::NoTone => Verb::NoTone,
            Usage::Eeprom => Verb::Eeprom,
            Usage::Gpio => Verb::Gpio,
            Usage::WifiConnect => Verb::Wifi,
        }
    }
}

/// A parsed console command.
///
/// Numeric arguments are kept as `i64` exactly as converted; range checks
/// belong to the handlers because the allowed domains are board specific.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // ========== Info Commands ==========
    /// List the commands the board supports.
    Help,
    /// Summary of board state.
    Status,
    /// Chip and firmware details.
    Info,
    /// Free/total memory.
    Memory,
    /// Time since boot.
    Uptime,
    /// Restart the board (`reset` and `restart`).
    Restart,

    // ========== LED Commands ==========
    /// Drive the LED high.
    LedOn,
    /// Drive the LED low.
    LedOff,
    /// Report the LED level.
    LedState,
    /// Toggle the LED a fixed number of times.
    Blink,

    // ========== Pin Commands ==========
    /// List digital pin levels (`pins` and bare `gpio`).
    Pins,
    /// Read all analog inputs.
    Analog,
    /// Read the chip temperature sensor.
    Temp,
    /// Set a PWM duty value.
    Pwm {
        /// Pin number.
        pin: i64,
        /// Duty value (0-255 accepted).
        value: i64,
    },
    /// Start a square wave on a pin.
    Tone {
        /// Pin number.
        pin: i64,
        /// Frequency in Hz (31-65535 accepted).
        freq: i64,
    },
    /// Stop a tone.
    NoTone {
        /// Pin number.
        pin: i64,
    },
    /// Drive a user-assignable output pin.
    GpioWrite {
        /// Pin number.
        pin: i64,
        /// 0 is LOW, anything else HIGH.
        value: i64,
    },

    // ========== Storage Commands ==========
    /// Read one byte from the non-volatile store.
    EepromRead {
        /// Byte address.
        addr: i64,
    },
    /// Write one byte to the non-volatile store.
    EepromWrite {
        /// Byte address.
        addr: i64,
        /// Byte value (0-255 accepted).
        value: i64,
    },

    // ========== Bus Commands ==========
    /// Probe the I2C bus.
    Scan,

    // ========== Board Specific ==========
    /// WiFi association status.
    Wifi,
    /// List visible networks.
    WifiScan,
    /// Associate with a network.
    WifiConnect {
        /// Network name, case preserved.
        ssid: String,
        /// Passphrase, case preserved.
        password: Option<String>,
    },
    /// Camera sensor status.
    Camera,
    /// Capture a single frame.
    Capture,
    /// Bluetooth channel status.
    Bluetooth,

    // ========== Rejections ==========
    /// A variadic command with the wrong number of arguments.
    Usage(Usage),
    /// Nothing in the grammar matched; holds the trimmed input.
    Unknown(String),
}

/// How a grammar phrase consumes the rest of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    /// Whole-line equality.
    Exact,
    /// Phrase followed by arguments.
    Prefix,
}

/// Builds a command from the argument tokens following a phrase.
type Builder = fn(&[&str]) -> Command;

struct Phrase {
    text: &'static str,
    form: Form,
    build: Builder,
}

const fn exact(text: &'static str, build: Builder) -> Phrase {
    Phrase {
        text,
        form: Form::Exact,
        build,
    }
}

const fn prefix(text: &'static str, build: Builder) -> Phrase {
    Phrase {
        text,
        form: Form::Prefix,
        build,
    }
}

static GRAMMAR: &[Phrase] = &[
    exact("help", |_| Command::Help),
    exact("status", |_| Command::Status),
    exact("info", |_| Command::Info),
    exact("memory", |_| Command::Memory),
    exact("uptime", |_| Command::Uptime),
    exact("reset", |_| Command::Restart),
    exact("restart", |_| Command::Restart),
    exact("led", |_| Command::LedState),
    exact("led on", |_| Command::LedOn),
    exact("led off", |_| Command::LedOff),
    exact("blink", |_| Command::Blink),
    exact("pins", |_| Command::Pins),
    exact("gpio", |_| Command::Pins),
    exact("analog", |_| Command::Analog),
    exact("temp", |_| Command::Temp),
    exact("scan", |_| Command::Scan),
    exact("wifi", |_| Command::Wifi),
    exact("wifi scan", |_| Command::WifiScan),
    exact("camera", |_| Command::Camera),
    exact("capture", |_| Command::Capture),
    exact("bluetooth", |_| Command::Bluetooth),
    prefix("pwm", |args| match args {
        [pin, value] => Command::Pwm {
            pin: parse_int(pin),
            value: parse_int(value),
        },
        _ => Command::Usage(Usage::Pwm),
    }),
    prefix("tone", |args| match args {
        [pin, freq] => Command::Tone {
            pin: parse_int(pin),
            freq: parse_int(freq),
        },
        _ => Command::Usage(Usage::Tone),
    }),
    prefix("notone", |args| match args {
        [pin] => Command::NoTone { pin: parse_int(pin) },
        _ => Command::Usage(Usage::NoTone),
    }),
    prefix("gpio", |args| match args {
        [pin, value] => Command::GpioWrite {
            pin: parse_int(pin),
            value: parse_int(value),
        },
        _ => Command::Usage(Usage::Gpio),
    }),
    prefix("eeprom", |_| Command::Usage(Usage::Eeprom)),
    prefix("eeprom read", |args| match args {
        [addr] => Command::EepromRead {
            addr: parse_int(addr),
        },
        _ => Command::Usage(Usage::Eeprom),
    }),
    prefix("eeprom write", |args| match args {
        [addr, value] => Command::EepromWrite {
            addr: parse_int(addr),
            value: parse_int(value),
        },
        _ => Command::Usage(Usage::Eeprom),
    }),
    prefix("wifi connect", |args| match args {
        [ssid] => Command::WifiConnect {
            ssid: ssid.to_string(),
            password: None,
        },
        [ssid, password] => Command::WifiConnect {
            ssid: ssid.to_string(),
            password: Some(password.to_string()),
        },
        _ => Command::Usage(Usage::WifiConnect),
    }),
];

/// Best-effort integer conversion.
///
/// Accepts optional leading whitespace, an optional sign and the leading run of
/// decimal digits. Anything without digits converts to 0, so a parse failure
/// cannot be told apart from a literal zero. Saturates instead of wrapping.
pub fn parse_int(token: &str) -> i64 {
    let s = token.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }

    if negative {
        -value
    } else {
        value
    }
}

impl Command {
    /// Parse a line into a command.
    ///
    /// The line is trimmed and matched case-insensitively. Argument tokens are
    /// cut from the trimmed original so string arguments keep their case.
    pub fn parse(line: &str) -> Command {
        let trimmed = line.trim();
        let lower = trimmed.to_ascii_lowercase();

        if let Some(phrase) = GRAMMAR
            .iter()
            .find(|p| p.form == Form::Exact && p.text == lower)
        {
            return (phrase.build)(&[]);
        }

        let best = GRAMMAR
            .iter()
            .filter(|p| p.form == Form::Prefix && continues_phrase(&lower, p.text))
            .max_by_key(|p| p.text.len());

        match best {
            Some(phrase) => {
                // ASCII lowercasing keeps byte offsets identical
                let args: Vec<&str> = trimmed[phrase.text.len()..].split_whitespace().collect();
                (phrase.build)(&args)
            }
            None => Command::Unknown(trimmed.to_string()),
        }
    }

    /// The command family, or `None` for an unknown line.
    pub fn verb(&self) -> Option<Verb> {
        let verb = match self {
            Command::Help => Verb::Help,
            Command::Status => Verb::Status,
            Command::Info => Verb::Info,
            Command::Memory => Verb::Memory,
            Command::Uptime => Verb::Uptime,
            Command::Restart => Verb::Restart,
            Command::LedOn | Command::LedOff | Command::LedState => Verb::Led,
            Command::Blink => Verb::Blink,
            Command::Pins => Verb::Pins,
            Command::Analog => Verb::Analog,
            Command::Temp => Verb::Temp,
            Command::Pwm { .. } => Verb::Pwm,
            Command::Tone { .. } => Verb::Tone,
            Command::NoTone { .. } => Verb::NoTone,
            Command::GpioWrite { .. } => Verb::Gpio,
            Command::EepromRead { .. } | Command::EepromWrite { .. } => Verb::Eeprom,
            Command::Scan => Verb::Scan,
            Command::Wifi | Command::WifiScan | Command::WifiConnect { .. } => Verb::Wifi,
            Command::Camera => Verb::Camera,
            Command::Capture => Verb::Capture,
            Command::Bluetooth => Verb::Bluetooth,
            Command::Usage(usage) => usage.verb(),
            Command::Unknown(_) => return None,
        };
        Some(verb)
    }
}

fn continues_phrase(line: &str, phrase: &str) -> bool {
    match line.strip_prefix(phrase) {
        Some(rest) => rest.is_empty() || rest.starts_with(|c: char| c.is_ascii_whitespace()),
        None => false,
    }
}
