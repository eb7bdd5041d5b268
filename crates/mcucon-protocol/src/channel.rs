//! Transport channel identities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// A transport that carries command text in and rendered text out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelId {
    /// Wired serial (USB/UART).
    Serial,
    /// Wireless serial (Bluetooth SPP or an HC-05 style module).
    Bluetooth,
    /// One-shot request/response exchange (HTTP command endpoint).
    Web,
}

impl ChannelId {
    /// The two persistent, polled channels.
    pub const AMBIENT: [ChannelId; 2] = [ChannelId::Serial, ChannelId::Bluetooth];

    /// Get the channel name used in logs, metrics and config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelId::Serial => "serial",
            ChannelId::Bluetooth => "bluetooth",
            ChannelId::Web => "web",
        }
    }

    /// Whether this is a persistent channel that takes part in output selection.
    pub fn is_ambient(&self) -> bool {
        !matches!(self, ChannelId::Web)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serial" => Ok(ChannelId::Serial),
            "bluetooth" | "bt" => Ok(ChannelId::Bluetooth),
            "web" | "http" => Ok(ChannelId::Web),
            other => Err(ProtocolError::UnknownChannel(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambient_channels() {
        assert!(ChannelId::Serial.is_ambient());
        assert!(ChannelId::Bluetooth.is_ambient());
        assert!(!ChannelId::Web.is_ambient());
    }

    #[test]
    fn test_parse_channel() {
        assert_eq!("BT".parse::<ChannelId>(), Ok(ChannelId::Bluetooth));
        assert_eq!("serial".parse::<ChannelId>(), Ok(ChannelId::Serial));
        assert!("usb".parse::<ChannelId>().is_err());
    }

    #[test]
    fn test_unknown_channel_error() {
        let err = "usb".parse::<ChannelId>().unwrap_err();
        assert_eq!(err, ProtocolError::UnknownChannel("usb".to_string()));
        assert_eq!(err.to_string(), "unknown channel: usb");
    }
}
