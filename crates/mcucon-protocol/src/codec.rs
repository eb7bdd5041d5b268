//! Line-based codec for console channels.
//!
//! Every channel gets its own buffer. Bytes accumulate until a `\n` or `\r`
//! terminator arrives; a terminator on an empty buffer is swallowed so that
//! `\r\n` pairs do not produce blank lines.

use std::collections::HashMap;

use bytes::BytesMut;

use crate::channel::ChannelId;

/// Default maximum command line length.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 256;

/// Outcome of a terminator arriving on a non-empty buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// A complete line, without its terminator.
    Line(String),
    /// The line grew past the bound and was discarded.
    Overflow {
        /// The bound that was exceeded.
        max: usize,
    },
}

fn is_terminator(byte: u8) -> bool {
    byte == b'\n' || byte == b'\r'
}

/// A codec for assembling lines received on a single channel.
#[derive(Debug)]
pub struct LineCodec {
    /// Buffer for accumulating incoming data.
    buffer: BytesMut,
    /// Longest line accepted.
    max_len: usize,
    /// Set once the current line has exceeded `max_len`.
    overflowed: bool,
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl LineCodec {
    /// Create a new line codec with the default bound.
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_LINE_LENGTH)
    }

    /// Create a new line codec accepting lines up to `max_len` bytes.
    pub fn with_max_len(max_len: usize) -> Self {
        LineCodec {
            buffer: BytesMut::with_capacity(max_len.min(DEFAULT_MAX_LINE_LENGTH)),
            max_len,
            overflowed: false,
        }
    }

    /// Feed a single byte.
    ///
    /// Returns an event when a terminator closes a non-empty line.
    pub fn feed(&mut self, byte: u8) -> Option<LineEvent> {
        if is_terminator(byte) {
            if self.overflowed {
                self.overflowed = false;
                self.buffer.clear();
                log::warn!("discarded console line longer than {} bytes", self.max_len);
                return Some(LineEvent::Overflow { max: self.max_len });
            }
            if self.buffer.is_empty() {
                return None;
            }
            let line = self.buffer.split();
            return Some(LineEvent::Line(String::from_utf8_lossy(&line).into_owned()));
        }

        if self.overflowed {
            return None;
        }
        if self.buffer.len() >= self.max_len {
            self.overflowed = true;
            self.buffer.clear();
            return None;
        }
        self.buffer.extend_from_slice(&[byte]);
        None
    }

    /// Feed a chunk of received data, collecting every completed event.
    pub fn push(&mut self, data: &[u8]) -> Vec<LineEvent> {
        data.iter().filter_map(|&b| self.feed(b)).collect()
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Get the configured bound.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.overflowed = false;
    }
}

/// Independent line buffers, one per channel.
#[derive(Debug)]
pub struct LineAccumulator {
    codecs: HashMap<ChannelId, LineCodec>,
    max_len: usize,
}

impl Default for LineAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl LineAccumulator {
    /// Create an accumulator with the default line bound.
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_LINE_LENGTH)
    }

    /// Create an accumulator whose per-channel buffers hold at most `max_len` bytes.
    pub fn with_max_len(max_len: usize) -> Self {
        LineAccumulator {
            codecs: HashMap::new(),
            max_len,
        }
    }

    fn codec(&mut self, channel: ChannelId) -> &mut LineCodec {
        let max_len = self.max_len;
        self.codecs
            .entry(channel)
            .or_insert_with(|| LineCodec::with_max_len(max_len))
    }

    /// Feed one byte received on `channel`.
    pub fn feed(&mut self, channel: ChannelId, byte: u8) -> Option<LineEvent> {
        self.codec(channel).feed(byte)
    }

    /// Feed a chunk received on `channel`.
    pub fn push(&mut self, channel: ChannelId, data: &[u8]) -> Vec<LineEvent> {
        self.codec(channel).push(data)
    }

    /// Number of bytes waiting for a terminator on `channel`.
    pub fn buffered_len(&self, channel: ChannelId) -> usize {
        self.codecs.get(&channel).map_or(0, LineCodec::buffered_len)
    }

    /// Drop any partial line on `channel`.
    pub fn clear(&mut self, channel: ChannelId) {
        if let Some(codec) = self.codecs.get_mut(&channel) {
            codec.clear();
        }
    }

    /// The per-channel bound.
    pub fn max_len(&self) -> usize {
        self.max_len
    }
}
