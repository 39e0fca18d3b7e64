//! Wire protocol types for the skiff function worker.
//!
//! The host (a serverless function orchestrator) and the worker talk over a
//! single long-lived bidirectional stream. This crate defines every message
//! that travels on that stream and the framing used to carry it:
//!
//! - Worker announcement (`StartStream`)
//! - Worker initialisation (host → worker, worker → host)
//! - Function metadata loading
//! - Function invocation and its correlated result
//!
//! [`FrameReader`] and [`FrameWriter`] move whole frames over any tokio
//! byte stream.
//!
//! # Wire Format
//!
//! Every message is wrapped in a frame with an 8-byte header:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              Frame Header (8 bytes, fixed)               │
//! ├──────────────┬──────────────┬────────────────────────────┤
//! │  Version (2) │ Msg Type (2) │    Payload Length (4)      │
//! ├──────────────┴──────────────┴────────────────────────────┤
//! │            rkyv-serialised StreamingMessage               │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use skiff_proto::{Codec, Content, StreamingMessage};
//!
//! let mut codec = Codec::new();
//! let message = StreamingMessage::new(
//!     "request-1",
//!     Content::StartStream { worker_id: "worker-1".into() },
//! );
//! let frame = codec.encode(&message).unwrap();
//! assert!(frame.len() > skiff_proto::FRAME_HEADER_SIZE);
//! ```

pub mod codec;
mod error;
mod message;
pub mod stream;
mod types;

pub use codec::{Codec, FrameHeader, MessageType, CURRENT_VERSION, FRAME_HEADER_SIZE, MAX_MESSAGE_SIZE};
pub use error::{ErrorCode, ProtocolError};
pub use message::{Content, StreamingMessage};
pub use stream::{FrameReader, FrameWriter};
pub use types::{
    BindingInfo, Direction, HttpParams, ParameterBinding, RpcFunctionMetadata, RpcHttp, Status,
    StatusResult, TypedData,
};

/// Protocol version constants.
pub mod version {
    /// Current protocol version.
    pub const CURRENT: u16 = 1;

    /// Minimum supported protocol version.
    pub const MIN_SUPPORTED: u16 = 1;
}
