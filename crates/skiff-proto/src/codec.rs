//! Frame encoding and decoding utilities.

use rkyv::rancor::Error as RkyvError;
use rkyv::util::AlignedVec;

use crate::error::ProtocolError;
use crate::message::StreamingMessage;

/// Frame header size in bytes.
pub const FRAME_HEADER_SIZE: usize = 8;

/// Default maximum message size (10 MB).
pub const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// Current protocol version.
pub const CURRENT_VERSION: u16 = crate::version::CURRENT;

/// Message type discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MessageType {
    /// Worker stream message.
    Streaming = 0x01,
}

impl MessageType {
    /// Creates a message type from a numeric value.
    #[must_use]
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x01 => Some(Self::Streaming),
            _ => None,
        }
    }

    /// Returns the numeric value of this message type.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Frame header for protocol messages.
///
/// Wire format (8 bytes, big-endian):
/// - Bytes 0-1: Protocol version (u16)
/// - Bytes 2-3: Message type (u16)
/// - Bytes 4-7: Payload length (u32)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Protocol version.
    pub version: u16,
    /// Message type discriminant.
    pub message_type: MessageType,
    /// Length of the payload in bytes.
    pub payload_len: u32,
}

impl FrameHeader {
    /// Creates a new frame header.
    #[must_use]
    pub const fn new(message_type: MessageType, payload_len: u32) -> Self {
        Self {
            version: CURRENT_VERSION,
            message_type,
            payload_len,
        }
    }

    /// Encodes the frame header to bytes.
    #[must_use]
    pub fn encode(&self) -> [u8; FRAME_HEADER_SIZE] {
        let mut buf = [0u8; FRAME_HEADER_SIZE];
        buf[0..2].copy_from_slice(&self.version.to_be_bytes());
        buf[2..4].copy_from_slice(&self.message_type.as_u16().to_be_bytes());
        buf[4..8].copy_from_slice(&self.payload_len.to_be_bytes());
        buf
    }

    /// Decodes a frame header from bytes.
    pub fn decode(bytes: &[u8; FRAME_HEADER_SIZE]) -> Result<Self, ProtocolError> {
        let version = u16::from_be_bytes([bytes[0], bytes[1]]);
        let message_type_raw = u16::from_be_bytes([bytes[2], bytes[3]]);
        let payload_len = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);

        let message_type = MessageType::from_u16(message_type_raw)
            .ok_or(ProtocolError::UnknownMessageType(message_type_raw))?;

        Ok(Self {
            version,
            message_type,
            payload_len,
        })
    }

    /// Checks if this header's version is supported.
    #[must_use]
    pub fn is_version_supported(&self) -> bool {
        self.version >= crate::version::MIN_SUPPORTED && self.version <= crate::version::CURRENT
    }

    /// Validates the version and the payload length against `max`.
    pub fn validate(&self, max: usize) -> Result<(), ProtocolError> {
        if !self.is_version_supported() {
            return Err(ProtocolError::UnsupportedVersion(self.version));
        }
        #[allow(clippy::as_conversions)]
        let len = self.payload_len as usize;
        if len > max {
            return Err(ProtocolError::MessageTooLarge { size: len, max });
        }
        Ok(())
    }
}

/// Codec for encoding and decoding stream messages.
#[derive(Debug)]
pub struct Codec {
    /// Reusable buffer for encoding.
    buffer: Vec<u8>,
    max_message_size: usize,
}

impl Default for Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec {
    /// Creates a codec with the default size limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_message_size(MAX_MESSAGE_SIZE)
    }

    /// Creates a codec that rejects payloads larger than `max_message_size`.
    #[must_use]
    pub fn with_max_message_size(max_message_size: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(8192),
            max_message_size,
        }
    }

    /// Returns the payload size limit.
    #[must_use]
    pub const fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// Encodes a message to bytes (frame header + payload).
    ///
    /// Returns the complete frame including the 8-byte header.
    pub fn encode(&mut self, message: &StreamingMessage) -> Result<&[u8], ProtocolError> {
        let payload = rkyv::to_bytes::<RkyvError>(message)
            .map_err(|e| ProtocolError::Serialisation(e.to_string()))?;

        if payload.len() > self.max_message_size {
            return Err(ProtocolError::MessageTooLarge {
                size: payload.len(),
                max: self.max_message_size,
            });
        }
        let payload_len = u32::try_from(payload.len()).map_err(|_| ProtocolError::MessageTooLarge {
            size: payload.len(),
            max: self.max_message_size,
        })?;

        let header = FrameHeader::new(MessageType::Streaming, payload_len);
        self.buffer.clear();
        self.buffer.extend_from_slice(&header.encode());
        self.buffer.extend_from_slice(&payload);

        Ok(&self.buffer)
    }

    /// Decodes a message from bytes.
    ///
    /// The bytes should NOT include the frame header - just the payload.
    pub fn decode(bytes: &[u8]) -> Result<StreamingMessage, ProtocolError> {
        // Archived data must be aligned; a plain Vec<u8> is not guaranteed to be.
        let mut aligned = AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);

        rkyv::from_bytes::<StreamingMessage, RkyvError>(&aligned)
            .map_err(|e| ProtocolError::Deserialisation(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::message::Content;

    #[test]
    fn frame_header_roundtrip() {
        let header = FrameHeader::new(MessageType::Streaming, 1024);
        let bytes = header.encode();
        let decoded = FrameHeader::decode(&bytes).unwrap();

        assert_eq!(header, decoded);
    }

    #[test]
    fn frame_header_unknown_type() {
        let mut bytes = FrameHeader::new(MessageType::Streaming, 10).encode();
        bytes[3] = 0x7F;

        let err = FrameHeader::decode(&bytes).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownMessageType(0x7F)));
    }

    #[test]
    fn frame_header_validation() {
        let valid = FrameHeader::new(MessageType::Streaming, 1000);
        assert!(valid.validate(MAX_MESSAGE_SIZE).is_ok());
        assert!(matches!(
            valid.validate(999),
            Err(ProtocolError::MessageTooLarge { size: 1000, max: 999 })
        ));

        let old = FrameHeader {
            version: 0,
            ..valid
        };
        assert!(!old.is_version_supported());
        assert!(matches!(
            old.validate(MAX_MESSAGE_SIZE),
            Err(ProtocolError::UnsupportedVersion(0))
        ));
    }

    #[test]
    fn codec_encode_decode() {
        let mut codec = Codec::new();
        let message = StreamingMessage::new(
            "req-1",
            Content::StartStream {
                worker_id: "worker-1".into(),
            },
        );

        let bytes = codec.encode(&message).unwrap().to_vec();
        assert!(bytes.len() > FRAME_HEADER_SIZE);

        let header_bytes: [u8; FRAME_HEADER_SIZE] = bytes[..FRAME_HEADER_SIZE].try_into().unwrap();
        let header = FrameHeader::decode(&header_bytes).unwrap();
        assert_eq!(header.message_type, MessageType::Streaming);
        assert_eq!(header.payload_len as usize, bytes.len() - FRAME_HEADER_SIZE);

        let decoded = Codec::decode(&bytes[FRAME_HEADER_SIZE..]).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn codec_rejects_oversized_message() {
        let mut codec = Codec::with_max_message_size(16);
        let message = StreamingMessage::new(
            "req-1",
            Content::StartStream {
                worker_id: "a-worker-id-that-does-not-fit".into(),
            },
        );

        assert!(matches!(
            codec.encode(&message),
            Err(ProtocolError::MessageTooLarge { max: 16, .. })
        ));
    }

    #[test]
    fn decode_garbage_fails() {
        let err = Codec::decode(&[0xFF; 7]).unwrap_err();
        assert!(matches!(err, ProtocolError::Deserialisation(_)));
    }
}
