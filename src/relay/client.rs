//! Front-end side of the relay protocol.
//!
//! Each call opens its own connection, writes one envelope, waits for one
//! status token and drops the connection.

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::RelayConfig;
use crate::relay::protocol::{RelayEnvelope, RelayStatus};

/// Largest reply read from the storage listener.
const REPLY_BUFFER_SIZE: usize = 1024;

/// Transport failures; all of them surface as [`RelayStatus::Error`].
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("failed to encode envelope: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to send envelope: {0}")]
    Send(#[source] std::io::Error),
    #[error("failed to receive reply: {0}")]
    Receive(#[source] std::io::Error),
    #[error("peer closed the connection without replying")]
    NoReply,
    #[error("reply is not valid UTF-8")]
    InvalidReply,
    #[error("no reply within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone)]
pub struct RelayClient {
    peer_addr: String,
    timeout: Duration,
}

impl RelayClient {
    pub fn new(peer_addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            peer_addr: peer_addr.into(),
            timeout,
        }
    }

    pub fn from_config(cfg: &RelayConfig) -> Self {
        Self::new(cfg.peer_addr.clone(), cfg.timeout())
    }

    /// Relays `envelope` and returns the peer's verdict.
    ///
    /// Transport failures are logged and reported as `Error`, the same as a
    /// rejection by the peer.
    pub async fn send(&self, envelope: &RelayEnvelope) -> RelayStatus {
        match self.try_send(envelope).await {
            Ok(status) => {
                tracing::info!(
                    peer = %self.peer_addr,
                    status = status.as_token(),
                    "Relay reply received"
                );
                status
            }
            Err(e) => {
                tracing::error!(peer = %self.peer_addr, error = %e, "Relay exchange failed");
                RelayStatus::Error
            }
        }
    }

    /// Like [`RelayClient::send`] but keeps the transport error.
    pub async fn try_send(&self, envelope: &RelayEnvelope) -> Result<RelayStatus, RelayError> {
        let payload = envelope.encode()?;

        timeout(self.timeout, self.exchange(&payload))
            .await
            .map_err(|_| RelayError::Timeout(self.timeout))?
    }

    async fn exchange(&self, payload: &[u8]) -> Result<RelayStatus, RelayError> {
        let mut stream = TcpStream::connect(&self.peer_addr)
            .await
            .map_err(|source| RelayError::Connect {
                addr: self.peer_addr.clone(),
                source,
            })?;

        tracing::debug!(peer = %self.peer_addr, bytes = payload.len(), "Sending envelope");
        stream.write_all(payload).await.map_err(RelayError::Send)?;

        let mut reply = [0u8; REPLY_BUFFER_SIZE];
        let n = stream.read(&mut reply).await.map_err(RelayError::Receive)?;
        if n == 0 {
            return Err(RelayError::NoReply);
        }

        let text = std::str::from_utf8(&reply[..n]).map_err(|_| RelayError::InvalidReply)?;
        let status = RelayStatus::from_reply(text);
        if status == RelayStatus::Error && text != RelayStatus::ERROR_TOKEN {
            tracing::warn!(reply = %text, "Unrecognized relay reply");
        }

        Ok(status)
    }
}
