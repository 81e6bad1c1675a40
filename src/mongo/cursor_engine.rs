use futures::TryStreamExt;
use mongodb::{bson::Document, Cursor};

/// Drains a cursor, stopping at the first error instead of skipping it.
pub async fn collect_all(cursor: Cursor<Document>) -> mongodb::error::Result<Vec<Document>> {
    cursor.try_collect().await
}
