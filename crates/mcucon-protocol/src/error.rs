//! Error types for the console protocol.

use thiserror::Error;

/// Errors that can occur when working with the console protocol.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A channel name that is not one of `serial`, `bluetooth` or `web`.
    #[error("unknown channel: {0}")]
    UnknownChannel(String),
}
