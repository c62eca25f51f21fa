//! Storage listener: the receiving end of the relay protocol.
//!
//! # Per-connection state machine
//!
//! ```text
//! AwaitData ──bytes──▶ Decode ──ok──▶ Enrich ──▶ Persist ──ok──▶ Reply(SUCCESS) ──▶ Closed
//!     │                  │                          │
//!     │ no bytes         └──────── err ─────────────┴──────────▶ Reply(ERROR) ──▶ Closed
//!     └──────────────────────────────────────────────────────────────────────────▶ Closed
//! ```
//!
//! A connection carries exactly one message.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::relay::protocol::{is_complete_message, RelayEnvelope, RelayStatus};
use crate::server::listener::Listener;
use crate::storage::{MessageStore, StoredRecord};

const READ_CHUNK_SIZE: usize = 1024;

#[derive(Debug, thiserror::Error)]
enum ReceiveError {
    #[error("message exceeds {0} bytes")]
    TooLarge(usize),
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
pub enum ListenerState {
    AwaitData,
    Decode(Vec<u8>),
    Enrich(RelayEnvelope),
    Persist(StoredRecord),
    Reply(RelayStatus),
    Closed,
}

/// Accepts relay connections until the listener fails.
pub async fn serve<S>(listener: Listener, store: Arc<S>, max_message_bytes: usize) -> anyhow::Result<()>
where
    S: MessageStore,
{
    listener
        .serve(move |stream, peer: SocketAddr| {
            let store = store.clone();
            async move {
                let status = handle_connection(stream, store.as_ref(), max_message_bytes).await;
                tracing::debug!(peer = %peer, status = ?status, "Relay connection closed");
            }
        })
        .await
}

/// Runs one connection through the state machine.
///
/// Returns the status sent back, or `None` when the peer closed before
/// sending anything.
pub async fn handle_connection<T, S>(mut stream: T, store: &S, max_message_bytes: usize) -> Option<RelayStatus>
where
    T: AsyncRead + AsyncWrite + Unpin,
    S: MessageStore,
{
    let mut state = ListenerState::AwaitData;
    let mut replied = None;

    loop {
        state = match state {
            ListenerState::AwaitData => match receive_message(&mut stream, max_message_bytes).await {
                Ok(Some(bytes)) => ListenerState::Decode(bytes),
                Ok(None) => ListenerState::Closed,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to receive relay message");
                    ListenerState::Reply(RelayStatus::Error)
                }
            },

            ListenerState::Decode(bytes) => match RelayEnvelope::decode(&bytes) {
                Ok(envelope) => ListenerState::Enrich(envelope),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to decode relay message");
                    ListenerState::Reply(RelayStatus::Error)
                }
            },

            ListenerState::Enrich(envelope) => ListenerState::Persist(StoredRecord::stamp(envelope)),

            ListenerState::Persist(record) => {
                let username = record.username.clone();
                let date = record.date.clone();
                match store.persist(record).await {
                    Ok(()) => {
                        tracing::info!(username = %username, date = %date, "Message stored");
                        ListenerState::Reply(RelayStatus::Success)
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to store message");
                        ListenerState::Reply(RelayStatus::Error)
                    }
                }
            }

            ListenerState::Reply(status) => {
                if let Err(e) = stream.write_all(status.as_token().as_bytes()).await {
                    tracing::warn!(error = %e, "Failed to send relay reply");
                }
                replied = Some(status);
                ListenerState::Closed
            }

            ListenerState::Closed => break,
        };
    }

    let _ = stream.shutdown().await;
    replied
}

/// Reads until one whole JSON value has arrived or the peer stops sending.
async fn receive_message<T>(stream: &mut T, max_message_bytes: usize) -> Result<Option<Vec<u8>>, ReceiveError>
where
    T: AsyncRead + Unpin,
{
    let mut buffer = Vec::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            // Incomplete JSON is left for the decoder to reject.
            return Ok((!buffer.is_empty()).then_some(buffer));
        }
        buffer.extend_from_slice(&chunk[..n]);

        if is_complete_message(&buffer) {
            return Ok(Some(buffer));
        }
        if buffer.len() > max_message_bytes {
            return Err(ReceiveError::TooLarge(max_message_bytes));
        }
    }
}
