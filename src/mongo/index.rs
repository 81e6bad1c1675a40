use futures::TryStreamExt;
use mongodb::bson::{Bson, Document};
use mongodb::error::ErrorKind;
use mongodb::Collection;

/// Server error code for a collection or database that does not exist.
const NAMESPACE_NOT_FOUND: i32 = 26;

/// Reports whether any index on the collection is a text index. A missing
/// collection has no indexes rather than being an error.
pub async fn has_text_index(collection: Collection<Document>) -> mongodb::error::Result<bool> {
    let mut cursor = match collection.list_indexes(None).await {
        Ok(cursor) => cursor,
        Err(err) => match err.kind.as_ref() {
            ErrorKind::Command(command) if command.code == NAMESPACE_NOT_FOUND => return Ok(false),
            _ => return Err(err),
        },
    };

    while let Some(index) = cursor.try_next().await? {
        if is_text_key(&index.keys) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Text indexes list their key as `{ _fts: "text", _ftsx: 1 }`.
pub fn is_text_key(keys: &Document) -> bool {
    keys.values()
        .any(|value| matches!(value, Bson::String(kind) if kind == "text"))
}
