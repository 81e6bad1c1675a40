//! Free-text search planning.
//!
//! Collections with a text index are searched with `$text`. Everything else
//! falls back to a case-insensitive regex OR across the string fields of a
//! single sample document. Fields absent from the sample are never searched.

use mongodb::bson::{doc, Bson, Document};

/// `{ $text: { $search: term } }`
pub fn text_clause(term: &str) -> Document {
    doc! { "$text": { "$search": term } }
}

/// Regex OR across every string-valued top-level field of `sample`.
///
/// Returns `None` when there is nothing to search, i.e. an empty collection
/// or a sample without string fields; such a search matches no documents.
/// The term is matched literally.
pub fn regex_clause(term: &str, sample: Option<&Document>) -> Option<Document> {
    let pattern = regex::escape(term);
    let branches: Vec<Bson> = sample?
        .iter()
        .filter(|(_, value)| matches!(value, Bson::String(_)))
        .map(|(field, _)| {
            Bson::Document(doc! { field: { "$regex": pattern.as_str(), "$options": "i" } })
        })
        .collect();

    if branches.is_empty() {
        None
    } else {
        Some(doc! { "$or": branches })
    }
}

/// Joins a raw filter and a search clause under `$and` when both exist.
pub fn combine(filter: Option<Document>, search: Option<Document>) -> Document {
    match (filter, search) {
        (Some(filter), Some(search)) if !filter.is_empty() => doc! { "$and": [filter, search] },
        (_, Some(search)) => search,
        (Some(filter), None) => filter,
        (None, None) => Document::new(),
    }
}
