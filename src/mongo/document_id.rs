use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Document identifier with an explicit representation.
///
/// On the wire it is `{"kind": "objectId" | "string", "value": "..."}`. An
/// `objectId` value must be 24 hex digits; this is checked when the value is
/// deserialized, so nothing downstream has to guess.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DocumentIdRepr", into = "DocumentIdRepr")]
pub enum DocumentId {
    ObjectId(ObjectId),
    String(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum DocumentIdRepr {
    ObjectId(String),
    String(String),
}

impl TryFrom<DocumentIdRepr> for DocumentId {
    type Error = String;

    fn try_from(repr: DocumentIdRepr) -> Result<Self, Self::Error> {
        match repr {
            DocumentIdRepr::ObjectId(hex) => ObjectId::parse_str(&hex)
                .map(DocumentId::ObjectId)
                .map_err(|err| format!("invalid ObjectId '{hex}': {err}")),
            DocumentIdRepr::String(value) => Ok(DocumentId::String(value)),
        }
    }
}

impl From<DocumentId> for DocumentIdRepr {
    fn from(id: DocumentId) -> Self {
        match id {
            DocumentId::ObjectId(oid) => DocumentIdRepr::ObjectId(oid.to_hex()),
            DocumentId::String(value) => DocumentIdRepr::String(value),
        }
    }
}

impl DocumentId {
    /// Tags a stored `_id`. Identifiers that are neither ObjectIds nor
    /// strings have no tagged form.
    pub fn from_bson(value: &Bson) -> Option<Self> {
        match value {
            Bson::ObjectId(oid) => Some(DocumentId::ObjectId(*oid)),
            Bson::String(s) => Some(DocumentId::String(s.clone())),
            _ => None,
        }
    }

    pub fn to_bson(&self) -> Bson {
        match self {
            DocumentId::ObjectId(oid) => Bson::ObjectId(*oid),
            DocumentId::String(s) => Bson::String(s.clone()),
        }
    }

    /// `{ _id: <id> }`
    pub fn filter(&self) -> Document {
        doc! { "_id": self.to_bson() }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentId::ObjectId(oid) => f.write_str(&oid.to_hex()),
            DocumentId::String(s) => f.write_str(s),
        }
    }
}
