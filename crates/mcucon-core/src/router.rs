//! Output routing between channels.
//!
//! Ambient channels (wired and wireless serial) share one output selection:
//! whichever ambient channel last delivered a complete line receives every
//! response until the other one speaks. The request/response channel never
//! reads or changes that selection.

use std::collections::HashMap;

use mcucon_protocol::{to_serial_text, ChannelId, PROMPT};
use tracing::info;

// ============================================================================
// Output Sink
// ============================================================================

/// Destination for rendered text, implemented by each transport.
pub trait OutputSink {
    /// Write text to one channel. Delivery is best effort.
    fn write_channel(&mut self, channel: ChannelId, text: &str);
}

/// A sink that collects output per channel in memory.
#[derive(Debug, Default, Clone)]
pub struct BufferedSink {
    output: HashMap<ChannelId, String>,
}

impl BufferedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written to `channel` so far.
    pub fn output(&self, channel: ChannelId) -> &str {
        self.output.get(&channel).map(String::as_str).unwrap_or("")
    }

    /// Remove and return what was written to `channel`.
    pub fn take(&mut self, channel: ChannelId) -> String {
        self.output.remove(&channel).unwrap_or_default()
    }

    /// Whether nothing has been written to any channel.
    pub fn is_empty(&self) -> bool {
        self.output.values().all(String::is_empty)
    }
}

impl OutputSink for BufferedSink {
    fn write_channel(&mut self, channel: ChannelId, text: &str) {
        self.output.entry(channel).or_default().push_str(text);
    }
}

// ============================================================================
// Ambient Channel Selector
// ============================================================================

/// Two-state machine choosing which ambient channel receives output.
///
/// Starts on wired serial. The only transition: a complete line arriving on an
/// ambient channel selects that channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSelector {
    active: ChannelId,
}

impl Default for ChannelSelector {
    fn default() -> Self {
        ChannelSelector {
            active: ChannelId::Serial,
        }
    }
}

impl ChannelSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The channel currently receiving output.
    pub fn active(&self) -> ChannelId {
        self.active
    }

    /// Record a completed line from `channel`. Returns true if the selection
    /// changed. Non-ambient channels are ignored.
    pub fn observe(&mut self, channel: ChannelId) -> bool {
        if !channel.is_ambient() || channel == self.active {
            return false;
        }
        self.active = channel;
        true
    }
}

// ============================================================================
// Output Router
// ============================================================================

/// Fans rendered responses out to the selected ambient channel.
#[derive(Debug, Default)]
pub struct OutputRouter {
    selector: ChannelSelector,
}

impl OutputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The ambient channel receiving output.
    pub fn active(&self) -> ChannelId {
        self.selector.active()
    }

    /// Apply the selection rule for a line heard on `channel`.
    pub fn heard_from(&mut self, channel: ChannelId) -> bool {
        let previous = self.selector.active();
        let changed = self.selector.observe(channel);
        if changed {
            info!("Output channel switched from {} to {}", previous, channel);
        }
        changed
    }

    /// Write a response to the active channel with serial line endings.
    pub fn emit<S: OutputSink + ?Sized>(&self, sink: &mut S, text: &str) {
        let rendered = to_serial_text(text);
        if !rendered.is_empty() {
            sink.write_channel(self.active(), &rendered);
        }
    }

    /// Write the prompt marker to the active channel.
    pub fn prompt<S: OutputSink + ?Sized>(&self, sink: &mut S) {
        sink.write_channel(self.active(), PROMPT);
    }

    /// Forget the selection, as after a reboot.
    pub fn reset(&mut self) {
        self.selector = ChannelSelector::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_starts_on_serial() {
        assert_eq!(ChannelSelector::new().active(), ChannelId::Serial);
    }

    #[test]
    fn test_selector_last_ambient_wins() {
        let mut selector = ChannelSelector::new();
        assert!(selector.observe(ChannelId::Bluetooth));
        assert!(!selector.observe(ChannelId::Bluetooth));
        assert_eq!(selector.active(), ChannelId::Bluetooth);
        assert!(selector.observe(ChannelId::Serial));
        assert_eq!(selector.active(), ChannelId::Serial);
    }

    #[test]
    fn test_selector_ignores_web() {
        let mut selector = ChannelSelector::new();
        selector.observe(ChannelId::Bluetooth);
        assert!(!selector.observe(ChannelId::Web));
        assert_eq!(selector.active(), ChannelId::Bluetooth);
    }

    #[test]
    fn test_emit_goes_to_active_only() {
        let mut router = OutputRouter::new();
        let mut sink = BufferedSink::new();
        router.heard_from(ChannelId::Bluetooth);
        router.emit(&mut sink, "LED ON");
        router.prompt(&mut sink);
        assert_eq!(sink.output(ChannelId::Bluetooth), "LED ON\r\n> ");
        assert_eq!(sink.output(ChannelId::Serial), "");
    }

    #[test]
    fn test_router_reset() {
        let mut router = OutputRouter::new();
        router.heard_from(ChannelId::Bluetooth);
        router.reset();
        assert_eq!(router.active(), ChannelId::Serial);
    }
}
