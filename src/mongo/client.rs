use async_trait::async_trait;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::{ClientOptions, FindOptions};
use mongodb::{Client, Collection};
use std::sync::Arc;

use crate::config::ClientProfile;
use crate::error::{BridgeError, Result};
use crate::mongo::{cursor_engine, index};

/// Opens database handles. The registry only ever reaches the server
/// through this seam.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, uri: &str, profile: &ClientProfile) -> Result<Arc<dyn DatabaseHandle>>;
}

/// A live client handle, exclusively owned by the registry.
#[async_trait]
pub trait DatabaseHandle: Send + Sync {
    /// Administrative liveness check.
    async fn ping(&self) -> Result<()>;

    async fn list_database_names(&self) -> Result<Vec<String>>;

    async fn list_collection_names(&self, database: &str) -> Result<Vec<String>>;

    /// Whether the collection carries a full-text index.
    async fn has_text_index(&self, database: &str, collection: &str) -> Result<bool>;

    async fn sample_document(&self, database: &str, collection: &str) -> Result<Option<Document>>;

    async fn find(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Document>>;

    async fn count(&self, database: &str, collection: &str, filter: Document) -> Result<u64>;

    /// Returns the inserted `_id`.
    async fn insert_one(&self, database: &str, collection: &str, document: Document)
        -> Result<Bson>;

    /// Returns the matched count.
    async fn update_one(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<u64>;

    /// Returns the deleted count.
    async fn delete_one(&self, database: &str, collection: &str, filter: Document) -> Result<u64>;

    async fn close(&self);
}

pub struct MongoConnector {
    app_name: String,
}

impl MongoConnector {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

#[async_trait]
impl Connector for MongoConnector {
    async fn open(&self, uri: &str, profile: &ClientProfile) -> Result<Arc<dyn DatabaseHandle>> {
        let mut options = ClientOptions::parse(uri).await.map_err(|e| {
            BridgeError::connection(format!("Failed to parse MongoDB connection URI: {e}"))
        })?;

        options.app_name = Some(self.app_name.clone());
        options.connect_timeout = Some(profile.connect_timeout());
        options.server_selection_timeout = Some(profile.server_selection_timeout());
        if let Some(max) = profile.max_pool_size {
            options.max_pool_size = Some(max);
        }

        let client = Client::with_options(options)
            .map_err(|e| BridgeError::connection(format!("Failed to create MongoDB client: {e}")))?;

        Ok(Arc::new(MongoHandle { client }))
    }
}

pub struct MongoHandle {
    client: Client,
}

impl MongoHandle {
    fn collection(&self, database: &str, collection: &str) -> Collection<Document> {
        self.client.database(database).collection(collection)
    }
}

#[async_trait]
impl DatabaseHandle for MongoHandle {
    async fn ping(&self) -> Result<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        Ok(())
    }

    async fn list_database_names(&self) -> Result<Vec<String>> {
        Ok(self.client.list_database_names(None, None).await?)
    }

    async fn list_collection_names(&self, database: &str) -> Result<Vec<String>> {
        Ok(self.client.database(database).list_collection_names(None).await?)
    }

    async fn has_text_index(&self, database: &str, collection: &str) -> Result<bool> {
        Ok(index::has_text_index(self.collection(database, collection)).await?)
    }

    async fn sample_document(&self, database: &str, collection: &str) -> Result<Option<Document>> {
        Ok(self.collection(database, collection).find_one(None, None).await?)
    }

    async fn find(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Document>> {
        let mut options = FindOptions::default();
        options.skip = Some(skip);
        options.limit = Some(limit);

        let cursor = self
            .collection(database, collection)
            .find(filter, options)
            .await?;
        Ok(cursor_engine::collect_all(cursor).await?)
    }

    async fn count(&self, database: &str, collection: &str, filter: Document) -> Result<u64> {
        Ok(self
            .collection(database, collection)
            .count_documents(filter, None)
            .await?)
    }

    async fn insert_one(
        &self,
        database: &str,
        collection: &str,
        document: Document,
    ) -> Result<Bson> {
        let result = self
            .collection(database, collection)
            .insert_one(document, None)
            .await?;
        Ok(result.inserted_id)
    }

    async fn update_one(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<u64> {
        let result = self
            .collection(database, collection)
            .update_one(filter, update, None)
            .await?;
        Ok(result.matched_count)
    }

    async fn delete_one(&self, database: &str, collection: &str, filter: Document) -> Result<u64> {
        let result = self
            .collection(database, collection)
            .delete_one(filter, None)
            .await?;
        Ok(result.deleted_count)
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
    }
}
