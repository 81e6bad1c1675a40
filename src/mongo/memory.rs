//! In-memory server used by the test suites. It evaluates the small filter
//! dialect the query bridge emits: equality, `$and`, `$or`, `$regex` with
//! `$options` and `$text`.

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use regex::RegexBuilder;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

use crate::config::ClientProfile;
use crate::error::{BridgeError, Result};
use crate::mongo::client::{Connector, DatabaseHandle};

/// URIs containing this marker fail to open, like an unreachable host.
pub const UNREACHABLE_HOST: &str = "unreachable.invalid";

#[derive(Default)]
struct Collection {
    documents: Vec<Document>,
    text_index: bool,
}

#[derive(Default)]
struct ServerState {
    databases: BTreeMap<String, BTreeMap<String, Collection>>,
    fail_pings: bool,
    ping_gate: Option<Arc<Notify>>,
    opened: usize,
    closed: usize,
    index_probes: usize,
    find_calls: usize,
    last_filter: Option<Document>,
    updates: Vec<Document>,
    profiles: Vec<ClientProfile>,
    uris: Vec<String>,
}

#[derive(Default)]
pub struct MemoryServer {
    state: Mutex<ServerState>,
}

impl MemoryServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().expect("memory server lock poisoned")
    }

    pub fn seed(&self, database: &str, collection: &str, documents: Vec<Document>) {
        let mut state = self.state();
        let coll = state
            .databases
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default();
        for mut document in documents {
            if !document.contains_key("_id") {
                document.insert("_id", ObjectId::new());
            }
            coll.documents.push(document);
        }
    }

    pub fn create_text_index(&self, database: &str, collection: &str) {
        let mut state = self.state();
        state
            .databases
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default()
            .text_index = true;
    }

    pub fn fail_pings(&self, fail: bool) {
        self.state().fail_pings = fail;
    }

    /// Makes the next ping wait until the returned gate is notified.
    pub fn hold_pings(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state().ping_gate = Some(Arc::clone(&gate));
        gate
    }

    pub fn documents(&self, database: &str, collection: &str) -> Vec<Document> {
        self.state()
            .databases
            .get(database)
            .and_then(|colls| colls.get(collection))
            .map(|coll| coll.documents.clone())
            .unwrap_or_default()
    }

    pub fn opened(&self) -> usize {
        self.state().opened
    }

    pub fn closed(&self) -> usize {
        self.state().closed
    }

    pub fn index_probes(&self) -> usize {
        self.state().index_probes
    }

    pub fn find_calls(&self) -> usize {
        self.state().find_calls
    }

    pub fn last_filter(&self) -> Option<Document> {
        self.state().last_filter.clone()
    }

    pub fn updates(&self) -> Vec<Document> {
        self.state().updates.clone()
    }

    pub fn profiles(&self) -> Vec<ClientProfile> {
        self.state().profiles.clone()
    }

    pub fn uris(&self) -> Vec<String> {
        self.state().uris.clone()
    }
}

pub struct MemoryConnector {
    server: Arc<MemoryServer>,
}

impl MemoryConnector {
    pub fn new(server: Arc<MemoryServer>) -> Self {
        Self { server }
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn open(&self, uri: &str, profile: &ClientProfile) -> Result<Arc<dyn DatabaseHandle>> {
        let mut state = self.server.state();
        state.uris.push(uri.to_string());
        state.profiles.push(profile.clone());
        if uri.contains(UNREACHABLE_HOST) {
            return Err(BridgeError::connection(format!(
                "Server selection timeout: No available servers for {uri}"
            )));
        }
        state.opened += 1;
        Ok(Arc::new(MemoryHandle {
            server: Arc::clone(&self.server),
        }))
    }
}

struct MemoryHandle {
    server: Arc<MemoryServer>,
}

#[async_trait]
impl DatabaseHandle for MemoryHandle {
    async fn ping(&self) -> Result<()> {
        let gate = self.server.state().ping_gate.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.server.state().fail_pings {
            return Err(BridgeError::connection("Authentication failed"));
        }
        Ok(())
    }

    async fn list_database_names(&self) -> Result<Vec<String>> {
        Ok(self.server.state().databases.keys().cloned().collect())
    }

    async fn list_collection_names(&self, database: &str) -> Result<Vec<String>> {
        Ok(self
            .server
            .state()
            .databases
            .get(database)
            .map(|colls| colls.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn has_text_index(&self, database: &str, collection: &str) -> Result<bool> {
        let mut state = self.server.state();
        state.index_probes += 1;
        Ok(collection_ref(&state, database, collection).is_some_and(|c| c.text_index))
    }

    async fn sample_document(&self, database: &str, collection: &str) -> Result<Option<Document>> {
        let state = self.server.state();
        Ok(collection_ref(&state, database, collection).and_then(|c| c.documents.first().cloned()))
    }

    async fn find(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Document>> {
        let mut state = self.server.state();
        state.find_calls += 1;
        state.last_filter = Some(filter.clone());
        let matched = matching(&state, database, collection, &filter)?;
        Ok(matched
            .into_iter()
            .skip(skip as usize)
            .take(limit.unsigned_abs() as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, database: &str, collection: &str, filter: Document) -> Result<u64> {
        let state = self.server.state();
        Ok(matching(&state, database, collection, &filter)?.len() as u64)
    }

    async fn insert_one(
        &self,
        database: &str,
        collection: &str,
        mut document: Document,
    ) -> Result<Bson> {
        let id = match document.get("_id") {
            Some(id) => id.clone(),
            None => {
                let id = Bson::ObjectId(ObjectId::new());
                document.insert("_id", id.clone());
                id
            }
        };
        self.server.seed(database, collection, vec![document]);
        Ok(id)
    }

    async fn update_one(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<u64> {
        let mut state = self.server.state();
        state.updates.push(update.clone());
        let set = update
            .get_document("$set")
            .map_err(|_| BridgeError::operation("update document requires $set"))?
            .clone();

        let Some(coll) = state
            .databases
            .get_mut(database)
            .and_then(|colls| colls.get_mut(collection))
        else {
            return Ok(0);
        };
        for document in coll.documents.iter_mut() {
            if matches(document, &filter, coll.text_index)? {
                for (key, value) in &set {
                    document.insert(key.clone(), value.clone());
                }
                return Ok(1);
            }
        }
        Ok(0)
    }

    async fn delete_one(&self, database: &str, collection: &str, filter: Document) -> Result<u64> {
        let mut state = self.server.state();
        let Some(coll) = state
            .databases
            .get_mut(database)
            .and_then(|colls| colls.get_mut(collection))
        else {
            return Ok(0);
        };
        let mut position = None;
        for (i, document) in coll.documents.iter().enumerate() {
            if matches(document, &filter, coll.text_index)? {
                position = Some(i);
                break;
            }
        }
        Ok(match position {
            Some(i) => {
                coll.documents.remove(i);
                1
            }
            None => 0,
        })
    }

    async fn close(&self) {
        self.server.state().closed += 1;
    }
}

fn collection_ref<'a>(
    state: &'a ServerState,
    database: &str,
    collection: &str,
) -> Option<&'a Collection> {
    state.databases.get(database)?.get(collection)
}

fn matching<'a>(
    state: &'a ServerState,
    database: &str,
    collection: &str,
    filter: &Document,
) -> Result<Vec<&'a Document>> {
    let Some(coll) = collection_ref(state, database, collection) else {
        return Ok(Vec::new());
    };
    let mut out = Vec::new();
    for document in &coll.documents {
        if matches(document, filter, coll.text_index)? {
            out.push(document);
        }
    }
    Ok(out)
}

fn matches(document: &Document, filter: &Document, text_index: bool) -> Result<bool> {
    for (key, condition) in filter {
        let ok = match key.as_str() {
            "$and" => {
                let mut all = true;
                for clause in clauses(condition)? {
                    all &= matches(document, clause, text_index)?;
                }
                all
            }
            "$or" => {
                let mut any = false;
                for clause in clauses(condition)? {
                    any |= matches(document, clause, text_index)?;
                }
                any
            }
            "$text" => {
                if !text_index {
                    return Err(BridgeError::operation("text index required for $text query"));
                }
                let term = condition
                    .as_document()
                    .and_then(|d| d.get_str("$search").ok())
                    .unwrap_or_default()
                    .to_lowercase();
                document.values().any(|value| {
                    matches!(value, Bson::String(s) if s.to_lowercase().contains(&term))
                })
            }
            field => field_matches(document.get(field), condition)?,
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn clauses(condition: &Bson) -> Result<Vec<&Document>> {
    let Bson::Array(items) = condition else {
        return Err(BridgeError::operation("logical operator requires an array"));
    };
    items
        .iter()
        .map(|item| {
            item.as_document()
                .ok_or_else(|| BridgeError::operation("logical clause must be a document"))
        })
        .collect()
}

fn field_matches(value: Option<&Bson>, condition: &Bson) -> Result<bool> {
    match condition {
        Bson::Document(ops) if ops.contains_key("$regex") => {
            let pattern = ops
                .get_str("$regex")
                .map_err(|_| BridgeError::operation("$regex must be a string"))?;
            let options = ops.get_str("$options").unwrap_or_default();
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(options.contains('i'))
                .build()
                .map_err(|err| BridgeError::operation(err.to_string()))?;
            Ok(matches!(value, Some(Bson::String(s)) if regex.is_match(s)))
        }
        expected => Ok(value == Some(expected)),
    }
}
