//! Console tuning.

use mcucon_protocol::DEFAULT_MAX_LINE_LENGTH;
use serde::{Deserialize, Serialize};

/// Timing and limits used by the dispatcher and handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Longest accepted input line, per channel.
    pub max_line_length: usize,
    /// LED toggles performed by `blink`.
    pub blink_count: u32,
    /// On and off time of each blink.
    pub blink_interval_ms: u64,
    /// Association polls before `wifi connect` gives up.
    pub wifi_connect_attempts: u32,
    /// Delay between association polls.
    pub wifi_poll_interval_ms: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        ConsoleConfig {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            blink_count: 5,
            blink_interval_ms: 200,
            wifi_connect_attempts: 20,
            wifi_poll_interval_ms: 500,
        }
    }
}
