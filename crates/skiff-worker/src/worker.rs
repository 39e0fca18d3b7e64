//! The protocol loop.
//!
//! A [`Worker`] drives one stream: it announces itself, then reads one host
//! message at a time, hands it to the [`WorkerSession`] and queues the reply
//! on a bounded channel drained by a dedicated writer task. Replies are
//! queued before the next read, so wire order matches arrival order.

use skiff_proto::{FrameReader, FrameWriter, StreamingMessage, MAX_MESSAGE_SIZE};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::WorkerError;
use crate::message::InboundMessage;
use crate::session::WorkerSession;

const DEFAULT_OUTBOUND_CAPACITY: usize = 16;

/// Drives a [`WorkerSession`] over a duplex stream.
pub struct Worker {
    session: WorkerSession,
    max_message_size: usize,
    outbound_capacity: usize,
}

impl Worker {
    #[must_use]
    pub fn new(session: WorkerSession) -> Self {
        Self {
            session,
            max_message_size: MAX_MESSAGE_SIZE,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
        }
    }

    #[must_use]
    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    /// Sets the reply channel capacity. Values below one are raised to one.
    #[must_use]
    pub fn with_outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = capacity.max(1);
        self
    }

    /// Runs the protocol loop until the host closes the stream or `cancel`
    /// fires.
    ///
    /// Both of those are a normal shutdown. Transport failures and
    /// unrecognised host messages are returned as errors; no reply is sent
    /// for the offending message.
    pub async fn run<R, W>(
        mut self,
        reader: R,
        writer: W,
        cancel: CancellationToken,
    ) -> Result<(), WorkerError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let mut reader = FrameReader::new(reader, self.max_message_size);
        let mut writer = FrameWriter::new(writer, self.max_message_size);

        writer
            .write_message(&self.session.start_stream())
            .await
            .map_err(WorkerError::Handshake)?;
        info!(
            worker_id = %self.session.identity().worker_id,
            "worker announced"
        );

        let (tx, rx) = mpsc::channel(self.outbound_capacity);
        let writer_task = tokio::spawn(write_replies(writer, rx));

        let outcome = self.receive(&mut reader, &tx, &cancel).await;

        drop(tx);
        let drained = writer_task
            .await
            .unwrap_or_else(|e| Err(WorkerError::Writer(e.to_string())));

        match (outcome, drained) {
            (Err(WorkerError::OutboundClosed), Err(writer_error)) => Err(writer_error),
            (Err(e), _) => Err(e),
            (Ok(()), drained) => drained,
        }
    }

    async fn receive<R>(
        &mut self,
        reader: &mut FrameReader<R>,
        tx: &mpsc::Sender<StreamingMessage>,
        cancel: &CancellationToken,
    ) -> Result<(), WorkerError>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            let next = tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    info!("worker cancelled, shutting down");
                    return Ok(());
                }

                next = reader.read_message() => next?,
            };

            let Some(message) = next else {
                info!("host closed the stream");
                return Ok(());
            };

            let kind = message.content.kind();
            debug!(kind, "received message");

            let inbound = InboundMessage::try_from(message.content).inspect_err(|_| {
                warn!(kind, "unrecognised message kind, terminating");
            })?;

            let reply = self.session.handle(inbound).await;
            tx.send(reply).await.map_err(|_| WorkerError::OutboundClosed)?;
        }
    }
}

/// Writes queued replies in order, then closes the write side.
async fn write_replies<W>(
    mut writer: FrameWriter<W>,
    mut rx: mpsc::Receiver<StreamingMessage>,
) -> Result<(), WorkerError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(reply) = rx.recv().await {
        writer.write_message(&reply).await?;
    }
    writer.shutdown().await?;
    Ok(())
}
