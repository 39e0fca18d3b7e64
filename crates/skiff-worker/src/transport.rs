//! Connection to the host.
//!
//! Framing lives in [`skiff_proto::stream`]; this module only opens the
//! socket the frames travel over.

use tokio::net::TcpStream;
use tracing::debug;

use crate::error::WorkerError;

/// Opens the TCP stream to the host.
pub async fn connect(host: &str, port: u16) -> Result<TcpStream, WorkerError> {
    let stream = TcpStream::connect((host, port))
        .await
        .map_err(|source| WorkerError::Connect {
            address: format!("{host}:{port}"),
            source,
        })?;

    if let Err(e) = stream.set_nodelay(true) {
        debug!(error = %e, "could not disable Nagle's algorithm");
    }
    Ok(stream)
}
