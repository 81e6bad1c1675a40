use mongodb::bson::{doc, Document};
use serde_json::Value;

use crate::error::{BridgeError, Result};
use crate::mongo::document_id::DocumentId;
use crate::mongo::registry::ConnectionRegistry;
use crate::utils::json;

/// Removes `_id` so an update can never rewrite the identifier.
pub fn strip_identifier(mut changes: Document) -> Document {
    changes.remove("_id");
    changes
}

/// Inserts one document and returns its `_id` as a display string.
#[tracing::instrument(skip(registry, document))]
pub async fn insert_document(
    registry: &ConnectionRegistry,
    connection_id: &str,
    database: &str,
    collection: &str,
    document: Value,
) -> Result<String> {
    let entry = registry.entry(connection_id).await?;
    let document = json::json_to_document(document)?;
    let inserted = entry.handle().insert_one(database, collection, document).await?;
    Ok(json::display_id(&inserted))
}

/// Applies `changes` as a `$set` on the document with `document_id`.
#[tracing::instrument(skip(registry, document_id, changes), fields(document_id = %document_id))]
pub async fn update_document(
    registry: &ConnectionRegistry,
    connection_id: &str,
    database: &str,
    collection: &str,
    document_id: &DocumentId,
    changes: Value,
) -> Result<()> {
    let entry = registry.entry(connection_id).await?;
    let changes = strip_identifier(json::json_to_document(changes)?);
    if changes.is_empty() {
        return Err(BridgeError::operation("update has no fields to set"));
    }

    let matched = entry
        .handle()
        .update_one(database, collection, document_id.filter(), doc! { "$set": changes })
        .await?;
    if matched == 0 {
        tracing::debug!("update matched no document");
    }
    Ok(())
}

#[tracing::instrument(skip(registry, document_id), fields(document_id = %document_id))]
pub async fn delete_document(
    registry: &ConnectionRegistry,
    connection_id: &str,
    database: &str,
    collection: &str,
    document_id: &DocumentId,
) -> Result<()> {
    let entry = registry.entry(connection_id).await?;
    let deleted = entry
        .handle()
        .delete_one(database, collection, document_id.filter())
        .await?;
    if deleted == 0 {
        tracing::debug!("delete matched no document");
    }
    Ok(())
}
