//! # mcucon-core
//!
//! Command dispatch and channel routing for the board console.
//!
//! Data flows one way: raw bytes from a channel are assembled into lines,
//! each line is parsed once into a [`Command`](mcucon_protocol::Command), the
//! dispatcher runs the matching handler against the injected
//! [`Board`](mcucon_board::Board), and the rendered text goes back to the
//! ambient channel that last spoke (or is returned, on the request/response
//! path).
//!
//! ## Usage
//!
//! ```
//! use mcucon_board::{BoardKind, SimulatedBoard, SimulatedBoardConfig};
//! use mcucon_core::{BufferedSink, Console, ConsoleConfig};
//! use mcucon_protocol::ChannelId;
//!
//! let board = SimulatedBoard::new(BoardKind::Uno, SimulatedBoardConfig::default());
//! let mut console = Console::new(board, ConsoleConfig::default());
//! let mut sink = BufferedSink::new();
//!
//! console.feed(ChannelId::Bluetooth, b"eeprom write 10 42\n", &mut sink);
//! assert_eq!(sink.take(ChannelId::Bluetooth), "EEPROM[10] <- 42\r\n> ");
//!
//! // The web path returns bare text and leaves Bluetooth selected
//! assert_eq!(console.execute_request("eeprom read 10"), "EEPROM[10] = 42");
//! assert_eq!(console.active_channel(), ChannelId::Bluetooth);
//! ```

mod config;
mod console;
mod error;
pub mod handlers;
mod registry;
mod router;
mod stream;

pub use config::*;
pub use console::*;
pub use error::*;
pub use registry::*;
pub use router::*;
pub use stream::*;
