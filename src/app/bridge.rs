//! Request handlers behind the desktop IPC commands. Each call is independent
//! and invoked at most once; nothing here retries.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::error::Result;
use crate::mongo::crud;
use crate::mongo::descriptor::ConnectionDescriptor;
use crate::mongo::document_id::DocumentId;
use crate::mongo::query::{self, DocumentPage, QueryOptions};
use crate::mongo::registry::{ConnectionInfo, ConnectionRegistry};

/// Tagged result for connect and test calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_at: Option<DateTime<Utc>>,
}

impl ConnectOutcome {
    fn connected(at: Option<DateTime<Utc>>) -> Self {
        Self {
            success: true,
            error: None,
            connected_at: at,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            success: false,
            error: Some(message),
            connected_at: None,
        }
    }
}

#[derive(Clone)]
pub struct Bridge {
    registry: Arc<ConnectionRegistry>,
}

impl Bridge {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.registry)
    }

    pub async fn connect(&self, descriptor: &ConnectionDescriptor) -> ConnectOutcome {
        match self.registry.connect(descriptor).await {
            Ok(at) => ConnectOutcome::connected(Some(at)),
            Err(err) => ConnectOutcome::failed(err.to_string()),
        }
    }

    pub async fn test_connection(&self, descriptor: &ConnectionDescriptor) -> ConnectOutcome {
        match self.registry.test_connection(descriptor).await {
            Ok(()) => ConnectOutcome::connected(None),
            Err(err) => ConnectOutcome::failed(err.to_string()),
        }
    }

    pub async fn disconnect(&self, connection_id: &str) {
        self.registry.disconnect(connection_id).await;
    }

    pub async fn is_connected(&self, connection_id: &str) -> bool {
        self.registry.is_connected(connection_id).await
    }

    pub async fn connection_info(&self, connection_id: &str) -> Option<ConnectionInfo> {
        self.registry.info(connection_id).await
    }

    pub async fn list_databases(&self, connection_id: &str) -> Result<Vec<String>> {
        query::list_databases(&self.registry, connection_id).await
    }

    pub async fn list_collections(
        &self,
        connection_id: &str,
        database: &str,
    ) -> Result<Vec<String>> {
        query::list_collections(&self.registry, connection_id, database).await
    }

    pub async fn get_documents(
        &self,
        connection_id: &str,
        database: &str,
        collection: &str,
        options: Option<QueryOptions>,
    ) -> Result<DocumentPage> {
        let options = options.unwrap_or_default();
        query::get_documents(&self.registry, connection_id, database, collection, &options).await
    }

    pub async fn insert_document(
        &self,
        connection_id: &str,
        database: &str,
        collection: &str,
        document: Value,
    ) -> Result<String> {
        crud::insert_document(&self.registry, connection_id, database, collection, document).await
    }

    pub async fn update_document(
        &self,
        connection_id: &str,
        database: &str,
        collection: &str,
        document_id: &DocumentId,
        changes: Value,
    ) -> Result<()> {
        crud::update_document(
            &self.registry,
            connection_id,
            database,
            collection,
            document_id,
            changes,
        )
        .await
    }

    pub async fn delete_document(
        &self,
        connection_id: &str,
        database: &str,
        collection: &str,
        document_id: &DocumentId,
    ) -> Result<()> {
        crud::delete_document(&self.registry, connection_id, database, collection, document_id)
            .await
    }
}
