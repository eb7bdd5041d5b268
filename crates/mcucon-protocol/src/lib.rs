//! Board console line protocol
//!
//! This crate holds everything about the console's text protocol that does not
//! depend on hardware: turning raw channel bytes into lines, turning lines into
//! typed commands, and the shared text formats used when rendering responses.
//!
//! # Protocol Overview
//!
//! The console protocol is a simple line-based text interface:
//!
//! - **Commands** (operator → board): ASCII text terminated with `\n` or `\r`
//! - **Responses** (board → operator): ASCII text lines ending in `\r\n`
//! - **Prompt**: `> ` is written after every processed line on serial channels
//!
//! Verbs are case-insensitive. Lookup is exact phrase first (`led on`), then the
//! longest registered prefix (`eeprom write 10 42`), otherwise the line is an
//! unknown command that is echoed back verbatim.
//!
//! # Example
//!
//! ```rust
//! use mcucon_protocol::{ChannelId, Command, LineAccumulator, LineEvent};
//!
//! let mut lines = LineAccumulator::new();
//! let mut events = lines.push(ChannelId::Serial, b"PWM 9 128\r\n");
//! assert_eq!(events.len(), 1);
//!
//! if let LineEvent::Line(text) = events.remove(0) {
//!     assert_eq!(Command::parse(&text), Command::Pwm { pin: 9, value: 128 });
//! }
//! ```

mod channel;
mod codec;
mod commands;
mod error;
mod responses;

pub use channel::*;
pub use codec::*;
pub use commands::*;
pub use error::*;
pub use responses::*;
