use mongodb::bson::{Bson, Document};
use serde_json::Value;

use crate::error::{BridgeError, Result};

/// Convert BSON Document → relaxed extended JSON
pub fn document_to_json(doc: Document) -> Value {
    Bson::Document(doc).into_relaxed_extjson()
}

/// Convert (extended) JSON object → BSON Document
pub fn json_to_document(value: Value) -> Result<Document> {
    match Bson::try_from(value) {
        Ok(Bson::Document(doc)) => Ok(doc),
        Ok(_) => Err(BridgeError::operation("expected a JSON object")),
        Err(err) => Err(BridgeError::operation(format!("invalid extended JSON: {err}"))),
    }
}

/// Renders an `_id` value as a plain string for display.
pub fn display_id(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.clone().into_relaxed_extjson().to_string(),
    }
}

/// JSON form of a stored document with `_id` coerced to a display string.
pub fn to_display_json(mut doc: Document) -> Value {
    if let Some(id) = doc.get("_id") {
        let display = display_id(id);
        doc.insert("_id", display);
    }
    document_to_json(doc)
}
