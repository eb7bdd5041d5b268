//! Shared response text.
//!
//! Handlers render plain `\n`-separated text. Serial channels get it converted
//! to `\r\n` line endings followed by the prompt; the request/response path
//! returns it untouched.

use std::fmt;

/// Prompt written after every processed line on ambient channels.
pub const PROMPT: &str = "> ";

/// Marker at the start of every unknown-command response.
pub const UNKNOWN_COMMAND: &str = "Unknown command";

/// Hint that follows an unknown-command response.
pub const HELP_HINT: &str = "Type 'help' for available commands";

/// Render the response for a line that matched nothing.
pub fn unknown_command(text: &str) -> String {
    format!("{}: {}\n{}", UNKNOWN_COMMAND, text, HELP_HINT)
}

/// Render an I2C address as two zero-padded hex digits.
pub fn format_i2c_address(addr: u8) -> String {
    format!("0x{:02X}", addr)
}

/// Convert rendered text for a serial terminal.
///
/// Every line ends with `\r\n`; empty text stays empty.
pub fn to_serial_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for line in text.lines() {
        out.push_str(line);
        out.push_str("\r\n");
    }
    out
}

/// Elapsed time split into display units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uptime {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Uptime {
    /// Split a millisecond count. Sub-second remainders are dropped.
    pub fn from_millis(ms: u64) -> Self {
        let total_secs = ms / 1000;
        Uptime {
            days: total_secs / 86_400,
            hours: (total_secs % 86_400) / 3600,
            minutes: (total_secs % 3600) / 60,
            seconds: total_secs % 60,
        }
    }
}

impl fmt::Display for Uptime {
    /// Leading zero units are omitted; once a coarser unit is shown every finer
    /// unit follows, even when zero.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show_days = self.days > 0;
        let show_hours = show_days || self.hours > 0;
        let show_minutes = show_hours || self.minutes > 0;

        if show_days {
            write!(f, "{} days, ", self.days)?;
        }
        if show_hours {
            write!(f, "{} hours, ", self.hours)?;
        }
        if show_minutes {
            write!(f, "{} minutes, ", self.minutes)?;
        }
        write!(f, "{} seconds", self.seconds)
    }
}

/// Format milliseconds since boot for display.
pub fn format_uptime(ms: u64) -> String {
    Uptime::from_millis(ms).to_string()
}
