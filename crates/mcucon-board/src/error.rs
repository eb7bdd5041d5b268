//! Error types for board operations.

use thiserror::Error;

/// Errors reported by a board's peripherals.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// Byte address outside the non-volatile store.
    #[error("address {addr} is outside the {size}-byte store")]
    AddressOutOfRange {
        /// Requested address.
        addr: usize,
        /// Store capacity.
        size: usize,
    },

    /// Flushing the store to flash failed.
    #[error("EEPROM commit failed")]
    CommitFailed,

    /// The camera sensor did not come up at boot.
    #[error("Camera not initialized")]
    CameraNotInitialized,

    /// The sensor returned no frame buffer.
    #[error("Camera capture failed")]
    CaptureFailed,

    /// The board has no such peripheral.
    #[error("{0} is not available on this board")]
    Unsupported(&'static str),
}

/// Result type alias for board operations.
pub type BoardResult<T> = Result<T, BoardError>;
