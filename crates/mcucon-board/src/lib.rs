//! # mcucon-board
//!
//! Hardware abstraction for the board command console.
//!
//! Every peripheral operation the console can perform is a narrow method on the
//! [`Board`] trait. Handlers receive the board as an injected handle, never as
//! global state, so the same console runs against real hardware bindings or
//! against [`SimulatedBoard`] in tests and on the host.
//!
//! The three firmware variants differ only in their [`BoardProfile`]: pin
//! allow-lists, pins reserved by a transport, store capacity, serial bit rate
//! and which optional peripherals exist.
//!
//! ## Usage
//!
//! ```
//! use mcucon_board::{Board, BoardKind, SimulatedBoard, SimulatedBoardConfig};
//!
//! let mut board = SimulatedBoard::new(BoardKind::Uno, SimulatedBoardConfig::default());
//! board.eeprom_write(10, 42)?;
//! assert_eq!(board.eeprom_read(10)?, 42);
//! # Ok::<(), mcucon_board::BoardError>(())
//! ```

mod error;
mod hal;
mod profile;
mod simulated;

pub use error::*;
pub use hal::*;
pub use profile::*;
pub use simulated::*;
