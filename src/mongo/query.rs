use mongodb::bson::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BridgeError, Result};
use crate::mongo::document_id::DocumentId;
use crate::mongo::registry::ConnectionRegistry;
use crate::mongo::search;
use crate::utils::json;

pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Per-call paging and filtering for `get_documents`. Pages start at 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryOptions {
    pub page: u64,
    pub limit: u64,
    pub search: Option<String>,
    pub filter: Option<Value>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
            filter: None,
        }
    }
}

impl QueryOptions {
    pub fn validate(&self) -> Result<()> {
        if self.page == 0 {
            return Err(BridgeError::operation("page must be at least 1"));
        }
        if self.limit == 0 || self.limit > i64::MAX as u64 {
            return Err(BridgeError::operation("limit must be a positive integer"));
        }
        Ok(())
    }

    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// The trimmed search term, if any.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    pub fn filter_document(&self) -> Result<Option<Document>> {
        match &self.filter {
            None | Some(Value::Null) => Ok(None),
            Some(value) => json::json_to_document(value.clone()).map(Some),
        }
    }
}

/// One page of documents, `_id` rendered for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPage {
    pub documents: Vec<Value>,
    /// Tagged identifier of each document, aligned with `documents`.
    pub ids: Vec<Option<DocumentId>>,
    pub total: u64,
}

impl DocumentPage {
    pub fn empty() -> Self {
        Self {
            documents: Vec::new(),
            ids: Vec::new(),
            total: 0,
        }
    }

    fn from_documents(documents: Vec<Document>, total: u64) -> Self {
        let ids = documents
            .iter()
            .map(|doc| doc.get("_id").and_then(DocumentId::from_bson))
            .collect();
        let documents = documents.into_iter().map(json::to_display_json).collect();
        Self {
            documents,
            ids,
            total,
        }
    }
}

/// Database names in server order.
#[tracing::instrument(skip(registry))]
pub async fn list_databases(
    registry: &ConnectionRegistry,
    connection_id: &str,
) -> Result<Vec<String>> {
    let entry = registry.entry(connection_id).await?;
    entry.handle().list_database_names().await
}

#[tracing::instrument(skip(registry))]
pub async fn list_collections(
    registry: &ConnectionRegistry,
    connection_id: &str,
    database: &str,
) -> Result<Vec<String>> {
    let entry = registry.entry(connection_id).await?;
    entry.handle().list_collection_names(database).await
}

/// A page of documents plus the count of everything the filter matches.
#[tracing::instrument(skip(registry, options))]
pub async fn get_documents(
    registry: &ConnectionRegistry,
    connection_id: &str,
    database: &str,
    collection: &str,
    options: &QueryOptions,
) -> Result<DocumentPage> {
    options.validate()?;
    let entry = registry.entry(connection_id).await?;
    let filter = options.filter_document()?;

    let search = match options.search_term() {
        None => None,
        Some(term) => {
            if entry.has_text_index(database, collection).await? {
                Some(search::text_clause(term))
            } else {
                let sample = entry.handle().sample_document(database, collection).await?;
                match search::regex_clause(term, sample.as_ref()) {
                    Some(clause) => Some(clause),
                    None => {
                        tracing::debug!("no searchable string fields; returning empty page");
                        return Ok(DocumentPage::empty());
                    }
                }
            }
        }
    };

    let filter = search::combine(filter, search);
    let handle = entry.handle();
    let total = handle.count(database, collection, filter.clone()).await?;
    let documents = handle
        .find(database, collection, filter, options.skip(), options.limit as i64)
        .await?;

    tracing::debug!(returned = documents.len(), total, "fetched page");
    Ok(DocumentPage::from_documents(documents, total))
}
