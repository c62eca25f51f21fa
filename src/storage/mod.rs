//! Document store behind the storage listener.
//!
//! The listener only needs "persist this record or tell me it failed";
//! [`MessageStore`] is that seam. [`mongo::MongoStore`] is the production
//! implementation.

pub mod mongo;

use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::relay::protocol::RelayEnvelope;

pub use mongo::MongoStore;

/// Timestamp layout of [`StoredRecord::date`].
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// An envelope stamped with its time of receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub username: String,
    pub message: String,
    pub date: String,
}

impl StoredRecord {
    /// Stamps `envelope` with the current local time.
    pub fn stamp(envelope: RelayEnvelope) -> Self {
        Self {
            username: envelope.username,
            message: envelope.message,
            date: chrono::Local::now().format(DATE_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to connect to storage: {0}")]
    Connect(#[source] mongodb::error::Error),
    #[error("storage liveness check failed: {0}")]
    Ping(#[source] mongodb::error::Error),
    #[error("failed to insert record: {0}")]
    Insert(#[source] mongodb::error::Error),
}

pub trait MessageStore: Send + Sync + 'static {
    /// Persists one record. The store takes ownership and keeps no
    /// reference after returning.
    fn persist(&self, record: StoredRecord) -> impl Future<Output = Result<(), StoreError>> + Send;
}
