//! Console error type.
//!
//! Every variant renders the exact text the operator sees. Handlers return
//! `Err` for anything that stops them before (or instead of) touching hardware;
//! the dispatcher turns it into the response so the loop keeps running.

use mcucon_board::BoardError;
use mcucon_protocol::Usage;
use thiserror::Error;

/// Errors produced while handling one command.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConsoleError {
    /// Wrong number of arguments for a variadic command.
    #[error("{}", .0.text())]
    Usage(Usage),

    /// Pin outside the command's allow-list.
    #[error("Invalid {family} pin. Use: {allowed}")]
    PinNotAllowed {
        /// Command family, e.g. "PWM".
        family: &'static str,
        /// Comma separated allow-list.
        allowed: String,
    },

    /// Pin occupied by a transport channel.
    #[error("Pin {pin} is reserved for {purpose}")]
    ReservedPin { pin: u8, purpose: &'static str },

    /// Numeric argument outside its accepted domain.
    #[error("{what} must be between {min} and {max}")]
    OutOfRange {
        what: &'static str,
        min: i64,
        max: i64,
    },

    /// Store address outside `[0, capacity)`.
    #[error("Address out of range (0-{max})")]
    AddressOutOfRange { max: usize },

    /// A peripheral needed by the command is not available.
    #[error("{0}")]
    Unavailable(&'static str),

    /// Network association did not complete.
    #[error("Failed to connect to {ssid}")]
    ConnectFailed { ssid: String },

    /// Line discarded by the accumulator bound.
    #[error("Error: line too long (max {max} bytes)")]
    LineTooLong { max: usize },

    /// The board reported a fault.
    #[error("Error: {0}")]
    Board(BoardError),
}

impl ConsoleError {
    /// Short label used for the `reason` metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            ConsoleError::Usage(_) => "usage",
            ConsoleError::PinNotAllowed { .. } => "pin_not_allowed",
            ConsoleError::ReservedPin { .. } => "reserved_pin",
            ConsoleError::OutOfRange { .. } | ConsoleError::AddressOutOfRange { .. } => {
                "out_of_range"
            }
            ConsoleError::Unavailable(_) | ConsoleError::ConnectFailed { .. } => "unavailable",
            ConsoleError::LineTooLong { .. } => "line_too_long",
            ConsoleError::Board(_) => "board_fault",
        }
    }
}

impl From<BoardError> for ConsoleError {
    fn from(err: BoardError) -> Self {
        match err {
            BoardError::CameraNotInitialized => ConsoleError::Unavailable("Camera not initialized"),
            BoardError::AddressOutOfRange { size, .. } => ConsoleError::AddressOutOfRange {
                max: size.saturating_sub(1),
            },
            other => ConsoleError::Board(other),
        }
    }
}

/// Result type alias for handler operations.
pub type ConsoleResult<T> = Result<T, ConsoleError>;
