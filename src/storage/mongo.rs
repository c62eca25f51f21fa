use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::Client;
use std::time::Duration;

use crate::config::StorageConfig;
use crate::storage::{MessageStore, StoreError, StoredRecord};

/// MongoDB-backed store.
///
/// Every call builds its own client, pings the server, inserts and shuts the
/// client down again. Nothing is pooled between requests.
#[derive(Debug, Clone)]
pub struct MongoStore {
    uri: String,
    database: String,
    collection: String,
    connect_timeout: Duration,
}

impl MongoStore {
    pub fn from_config(cfg: &StorageConfig) -> Self {
        Self {
            uri: cfg.uri.clone(),
            database: cfg.database.clone(),
            collection: cfg.collection.clone(),
            connect_timeout: cfg.connect_timeout(),
        }
    }

    async fn connect(&self) -> Result<Client, StoreError> {
        let mut options = ClientOptions::parse(self.uri.as_str())
            .await
            .map_err(StoreError::Connect)?;
        options.connect_timeout = Some(self.connect_timeout);
        options.server_selection_timeout = Some(self.connect_timeout);

        let client = Client::with_options(options).map_err(StoreError::Connect)?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(StoreError::Ping)?;

        tracing::debug!(database = %self.database, "Connected to MongoDB");
        Ok(client)
    }

    async fn insert(&self, client: &Client, record: StoredRecord) -> Result<(), StoreError> {
        client
            .database(&self.database)
            .collection::<StoredRecord>(&self.collection)
            .insert_one(record)
            .await
            .map_err(StoreError::Insert)?;
        Ok(())
    }
}

impl MessageStore for MongoStore {
    async fn persist(&self, record: StoredRecord) -> Result<(), StoreError> {
        let client = self.connect().await?;
        let result = self.insert(&client, record).await;
        client.shutdown().await;
        result
    }
}
