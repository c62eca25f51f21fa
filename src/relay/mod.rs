//! Relay between the HTTP front end and the storage listener.
//!
//! - **`protocol`**: envelope and status token encoding
//! - **`client`**: one-shot request/reply from the front end
//! - **`server`**: the storage listener that persists envelopes

pub mod client;
pub mod protocol;
pub mod server;

pub use client::{RelayClient, RelayError};
pub use protocol::{RelayEnvelope, RelayStatus};
