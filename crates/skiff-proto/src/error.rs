//! Error types for the protocol.

use rkyv::{Archive, Deserialize, Serialize};
use thiserror::Error;

/// Protocol errors.
///
/// Any of these surfacing on the stream is fatal to the session.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Unsupported protocol version.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u16),

    /// Message too large.
    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// Unknown message type.
    #[error("unknown message type: {0}")]
    UnknownMessageType(u16),

    /// Serialisation error.
    #[error("serialisation error: {0}")]
    Serialisation(String),

    /// Deserialisation error.
    #[error("deserialisation error: {0}")]
    Deserialisation(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Structured error codes carried in a failed [`StatusResult`](crate::StatusResult).
#[derive(Archive, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    /// The invocation referenced a function that was never loaded.
    FunctionNotFound = 20,
    /// Function execution failed.
    FunctionFailed = 21,
    /// The function declares no binding the worker can populate.
    UnsupportedBinding = 22,
    /// Function execution exceeded the configured timeout.
    Timeout = 23,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FunctionNotFound => write!(f, "function_not_found"),
            Self::FunctionFailed => write!(f, "function_failed"),
            Self::UnsupportedBinding => write!(f, "unsupported_binding"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}
