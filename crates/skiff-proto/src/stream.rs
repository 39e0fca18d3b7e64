//! Reading and writing whole frames over an async byte stream.

use std::io::{self, ErrorKind};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::codec::{Codec, FrameHeader, FRAME_HEADER_SIZE};
use crate::error::ProtocolError;
use crate::message::StreamingMessage;

/// Reads whole messages from a byte stream.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    max_message_size: usize,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R, max_message_size: usize) -> Self {
        Self {
            inner,
            max_message_size,
        }
    }

    /// Reads the next message.
    ///
    /// Returns `Ok(None)` only when the peer closed the stream on a frame
    /// boundary. A stream that ends inside a header or payload is an
    /// [`ProtocolError::Io`] with [`ErrorKind::UnexpectedEof`].
    pub async fn read_message(&mut self) -> Result<Option<StreamingMessage>, ProtocolError> {
        let Some(header_buf) = self.read_header().await? else {
            return Ok(None);
        };

        let header = FrameHeader::decode(&header_buf)?;
        header.validate(self.max_message_size)?;

        #[allow(clippy::as_conversions)]
        let mut payload = vec![0u8; header.payload_len as usize];
        self.inner.read_exact(&mut payload).await?;

        Codec::decode(&payload).map(Some)
    }

    async fn read_header(&mut self) -> Result<Option<[u8; FRAME_HEADER_SIZE]>, ProtocolError> {
        let mut header_buf = [0u8; FRAME_HEADER_SIZE];
        let mut filled = 0;

        while filled < FRAME_HEADER_SIZE {
            let n = self.inner.read(&mut header_buf[filled..]).await?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("stream closed after {filled} of {FRAME_HEADER_SIZE} header bytes"),
                )
                .into());
            }
            filled += n;
        }

        Ok(Some(header_buf))
    }
}

/// Writes whole messages to a byte stream.
#[derive(Debug)]
pub struct FrameWriter<W> {
    inner: W,
    codec: Codec,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(inner: W, max_message_size: usize) -> Self {
        Self {
            inner,
            codec: Codec::with_max_message_size(max_message_size),
        }
    }

    /// Encodes and writes one message, flushing the stream.
    pub async fn write_message(&mut self, message: &StreamingMessage) -> Result<(), ProtocolError> {
        let bytes = self.codec.encode(message)?;
        self.inner.write_all(bytes).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Closes the write side of the stream.
    pub async fn shutdown(&mut self) -> Result<(), ProtocolError> {
        self.inner.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::codec::MAX_MESSAGE_SIZE;
    use crate::message::Content;

    fn start(worker_id: &str) -> StreamingMessage {
        StreamingMessage::new(
            "req-1",
            Content::StartStream {
                worker_id: worker_id.into(),
            },
        )
    }

    #[tokio::test]
    async fn write_then_read() {
        let (a, b) = tokio::io::duplex(4096);
        let mut writer = FrameWriter::new(a, MAX_MESSAGE_SIZE);
        let mut reader = FrameReader::new(b, MAX_MESSAGE_SIZE);

        writer.write_message(&start("w-1")).await.unwrap();
        writer.write_message(&start("w-2")).await.unwrap();

        assert_eq!(reader.read_message().await.unwrap(), Some(start("w-1")));
        assert_eq!(reader.read_message().await.unwrap(), Some(start("w-2")));
    }

    #[tokio::test]
    async fn header_split_across_writes() {
        let (mut a, b) = tokio::io::duplex(4096);
        let mut reader = FrameReader::new(b, MAX_MESSAGE_SIZE);

        let frame = Codec::new().encode(&start("w-1")).unwrap().to_vec();
        let read = tokio::spawn(async move { reader.read_message().await });

        a.write_all(&frame[..3]).await.unwrap();
        tokio::task::yield_now().await;
        a.write_all(&frame[3..]).await.unwrap();

        assert_eq!(read.await.unwrap().unwrap(), Some(start("w-1")));
    }

    #[tokio::test]
    async fn writer_enforces_size_limit() {
        let (a, _b) = tokio::io::duplex(4096);
        let mut writer = FrameWriter::new(a, 8);

        assert!(matches!(
            writer.write_message(&start("w-1")).await,
            Err(ProtocolError::MessageTooLarge { max: 8, .. })
        ));
    }
}
