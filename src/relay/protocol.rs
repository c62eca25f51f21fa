//! Wire format between the HTTP front end and the storage listener.
//!
//! A connection carries exactly one JSON object from the client, then
//! exactly one ASCII status token back. There is no length prefix: the
//! request ends where the JSON value ends, the reply ends where the
//! connection ends.

use serde::{Deserialize, Serialize};

/// Payload sent from the front end to the storage listener.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayEnvelope {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid envelope JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl RelayEnvelope {
    pub fn new(username: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            message: message.into(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Whether `bytes` already hold one whole JSON value.
///
/// Malformed input counts as complete: reading more would not fix it, and
/// decoding will reject it.
pub fn is_complete_message(bytes: &[u8]) -> bool {
    match serde_json::from_slice::<serde::de::IgnoredAny>(bytes) {
        Ok(_) => true,
        Err(e) => !e.is_eof(),
    }
}

/// The only information returned to the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayStatus {
    Success,
    Error,
}

impl RelayStatus {
    pub const SUCCESS_TOKEN: &'static str = "SUCCESS";
    pub const ERROR_TOKEN: &'static str = "ERROR";

    pub fn as_token(&self) -> &'static str {
        match self {
            RelayStatus::Success => Self::SUCCESS_TOKEN,
            RelayStatus::Error => Self::ERROR_TOKEN,
        }
    }

    /// Anything other than the exact success token is an error.
    pub fn from_reply(reply: &str) -> Self {
        if reply == Self::SUCCESS_TOKEN {
            RelayStatus::Success
        } else {
            RelayStatus::Error
        }
    }
}
