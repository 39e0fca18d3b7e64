//! Error types for the worker.

use std::time::Duration;

use skiff_proto::{ErrorCode, ProtocolError};
use thiserror::Error;

/// Fatal worker errors.
///
/// Any of these ends the session; the host is expected to relaunch the
/// worker process.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Framing or decoding failure on the stream.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The start-of-stream announcement could not be written.
    #[error("failed to announce worker: {0}")]
    Handshake(#[source] ProtocolError),

    /// The host sent a message kind the worker does not handle.
    #[error("unexpected message from host: {kind}")]
    UnexpectedMessage { kind: &'static str },

    /// The outbound writer stopped accepting replies.
    #[error("outbound stream closed")]
    OutboundClosed,

    /// The outbound writer task panicked or was aborted.
    #[error("stream writer task failed: {0}")]
    Writer(String),

    /// Connecting to the host failed.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by a script engine.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The engine program could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The script ran and reported failure.
    #[error("script exited with status {code}: {stderr}")]
    Failed { code: i32, stderr: String },

    /// The argument could not be handed to the script.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// Engine-specific failure detail.
    #[error("{0}")]
    Script(String),

    /// I/O failure while talking to the script.
    #[error("script I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reportable invocation failures.
///
/// These never cross the protocol loop; they are folded into the status of
/// the correlated invocation reply.
#[derive(Debug, Error)]
pub enum InvocationError {
    /// The invocation referenced a function id that was never loaded.
    #[error("function not loaded: {0}")]
    FunctionNotLoaded(String),

    /// The function declares no out binding of type `http`.
    #[error("skiff worker only handles http out binding for now.")]
    NoHttpOutputBinding,

    /// The engine failed to run the script.
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// The engine did not finish within the configured timeout.
    #[error("function timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl InvocationError {
    /// Returns the wire error code for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::FunctionNotLoaded(_) => ErrorCode::FunctionNotFound,
            Self::NoHttpOutputBinding => ErrorCode::UnsupportedBinding,
            Self::Execution(_) => ErrorCode::FunctionFailed,
            Self::Timeout(_) => ErrorCode::Timeout,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Settings could not be loaded or parsed.
    #[error("failed to load settings: {0}")]
    Settings(String),

    /// A setting has an unusable value.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_error_codes() {
        assert_eq!(
            InvocationError::FunctionNotLoaded("f".into()).code(),
            ErrorCode::FunctionNotFound
        );
        assert_eq!(
            InvocationError::NoHttpOutputBinding.code(),
            ErrorCode::UnsupportedBinding
        );
        assert_eq!(
            InvocationError::Timeout(Duration::from_secs(5)).code(),
            ErrorCode::Timeout
        );
        assert_eq!(
            InvocationError::from(ExecutionError::Script("boom".into())).code(),
            ErrorCode::FunctionFailed
        );
    }

    #[test]
    fn execution_detail_passes_through() {
        let err = InvocationError::from(ExecutionError::Script("Write-Error: nope".into()));
        assert_eq!(err.to_string(), "Write-Error: nope");

        let err = InvocationError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "function timed out after 30s");
    }
}
