//! HTTP front end.
//!
//! A deliberately small HTTP/1.1 implementation: one request per
//! connection, no keep-alive, no chunked bodies.
//!
//! - **`connection`**: per-connection state machine
//! - **`reader`**: assembles a request from the byte stream
//! - **`parser`**: request line and header parsing
//! - **`request`** / **`response`**: message types
//! - **`writer`**: serializes and writes responses
//! - **`router`**: dispatch on method and path, submit handler
//! - **`mime`**: MIME type detection based on file extensions
//! - **`pages`**: inline HTML bodies
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Read head and declared body
//!        └──────┬──────┘
//!               │ Request parsed        (malformed → Closed, no response)
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Route and build response
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Single write of the whole response
//!        └──────┬───────────┘
//!               ▼
//!             Closed
//! ```

pub mod connection;
pub mod mime;
pub mod pages;
pub mod parser;
pub mod reader;
pub mod request;
pub mod response;
pub mod router;
pub mod writer;

use std::sync::Arc;

use crate::server::listener::Listener;
use connection::Connection;
use router::AppState;

/// Accepts HTTP connections until the listener fails.
pub async fn serve(listener: Listener, app: Arc<AppState>) -> anyhow::Result<()> {
    listener
        .serve(move |socket, peer| {
            let app = app.clone();
            async move {
                let mut conn = Connection::new(socket);
                if let Err(e) = conn.run(&app).await {
                    tracing::warn!("Connection error from {}: {:#}", peer, e);
                }
            }
        })
        .await
}
