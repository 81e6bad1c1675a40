//! Process-wide table of live database handles, keyed by connection id.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::config::ClientProfile;
use crate::error::{BridgeError, Result};
use crate::mongo::client::{Connector, DatabaseHandle};
use crate::mongo::descriptor::ConnectionDescriptor;
use crate::mongo::uri::{build_connection_string, redact_credentials};

/// A connected handle plus what the registry knows about it.
pub struct RegistryEntry {
    handle: Arc<dyn DatabaseHandle>,
    bound_database: Option<String>,
    connected: bool,
    connected_at: DateTime<Utc>,
    /// Text-index capability per (database, collection), probed once.
    text_indexes: RwLock<HashMap<(String, String), bool>>,
}

impl RegistryEntry {
    fn new(handle: Arc<dyn DatabaseHandle>, bound_database: Option<String>) -> Self {
        Self {
            handle,
            bound_database,
            connected: true,
            connected_at: Utc::now(),
            text_indexes: RwLock::new(HashMap::new()),
        }
    }

    pub fn handle(&self) -> &dyn DatabaseHandle {
        self.handle.as_ref()
    }

    pub fn bound_database(&self) -> Option<&str> {
        self.bound_database.as_deref()
    }

    pub async fn has_text_index(&self, database: &str, collection: &str) -> Result<bool> {
        let key = (database.to_string(), collection.to_string());
        if let Some(known) = self.text_indexes.read().await.get(&key) {
            return Ok(*known);
        }

        let found = self.handle.has_text_index(database, collection).await?;
        tracing::debug!(database, collection, text_index = found, "probed text index");
        self.text_indexes.write().await.insert(key, found);
        Ok(found)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bound_database: Option<String>,
    pub is_connected: bool,
    pub connected_at: DateTime<Utc>,
}

pub struct ConnectionRegistry {
    connector: Arc<dyn Connector>,
    connect_profile: ClientProfile,
    test_profile: ClientProfile,
    entries: RwLock<HashMap<String, Arc<RegistryEntry>>>,
    /// Serializes connect calls per identifier.
    connect_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ConnectionRegistry {
    pub fn new(
        connector: Arc<dyn Connector>,
        connect_profile: ClientProfile,
        test_profile: ClientProfile,
    ) -> Self {
        Self {
            connector,
            connect_profile,
            test_profile,
            entries: RwLock::new(HashMap::new()),
            connect_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Opens and pings a handle, then stores it under the descriptor's id.
    ///
    /// The previous handle for the id, if any, is closed only after the new
    /// one is verified, so a failed reconnect leaves the old entry in place.
    #[tracing::instrument(
        skip(self, descriptor),
        fields(connection_id = %descriptor.id, connection_name = %descriptor.name)
    )]
    pub async fn connect(&self, descriptor: &ConnectionDescriptor) -> Result<DateTime<Utc>> {
        let lock = self.connect_lock(&descriptor.id).await;
        let result = {
            let _serialized = lock.lock().await;
            self.connect_serialized(descriptor).await
        };
        self.release_connect_lock(&descriptor.id, lock).await;
        result
    }

    async fn connect_serialized(&self, descriptor: &ConnectionDescriptor) -> Result<DateTime<Utc>> {
        tracing::info!("connecting");
        let handle = self
            .open_verified(descriptor, &self.connect_profile)
            .await
            .map_err(|err| {
                tracing::error!(error = %err, "failed to connect");
                err
            })?;

        let entry = Arc::new(RegistryEntry::new(
            handle,
            descriptor.database_name().map(str::to_string),
        ));
        let connected_at = entry.connected_at;

        let previous = self
            .entries
            .write()
            .await
            .insert(descriptor.id.clone(), entry);
        if let Some(previous) = previous {
            tracing::info!("closing handle replaced by reconnect");
            previous.handle.close().await;
        }

        tracing::info!("connection established");
        Ok(connected_at)
    }

    /// Closes and forgets the handle for `connection_id`. Unknown ids are a
    /// no-op. Waits for an in-flight connect on the same id to finish first.
    #[tracing::instrument(skip(self))]
    pub async fn disconnect(&self, connection_id: &str) {
        let lock = self.connect_lock(connection_id).await;
        {
            let _serialized = lock.lock().await;
            let removed = self.entries.write().await.remove(connection_id);
            match removed {
                Some(entry) => {
                    entry.handle.close().await;
                    tracing::info!("disconnected");
                }
                None => tracing::debug!("no connection to close"),
            }
        }
        self.release_connect_lock(connection_id, lock).await;
    }

    /// Like `connect` with the short test profile. The handle is always
    /// closed and the registry is never touched.
    #[tracing::instrument(skip(self, descriptor), fields(connection_id = %descriptor.id))]
    pub async fn test_connection(&self, descriptor: &ConnectionDescriptor) -> Result<()> {
        let handle = self.open_verified(descriptor, &self.test_profile).await?;
        handle.close().await;
        tracing::debug!("connection test succeeded");
        Ok(())
    }

    pub async fn is_connected(&self, connection_id: &str) -> bool {
        self.entries
            .read()
            .await
            .get(connection_id)
            .is_some_and(|entry| entry.connected)
    }

    pub async fn info(&self, connection_id: &str) -> Option<ConnectionInfo> {
        self.entries
            .read()
            .await
            .get(connection_id)
            .map(|entry| ConnectionInfo {
                id: connection_id.to_string(),
                bound_database: entry.bound_database.clone(),
                is_connected: entry.connected,
                connected_at: entry.connected_at,
            })
    }

    pub async fn connection_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Looks up a connected entry. The map lock is released before the
    /// caller does any I/O on the handle.
    pub async fn entry(&self, connection_id: &str) -> Result<Arc<RegistryEntry>> {
        self.entries
            .read()
            .await
            .get(connection_id)
            .filter(|entry| entry.connected)
            .cloned()
            .ok_or_else(|| BridgeError::NoActiveConnection(connection_id.to_string()))
    }

    /// Closes every handle. Called once at process shutdown.
    pub async fn close_all(&self) {
        let drained: Vec<(String, Arc<RegistryEntry>)> =
            self.entries.write().await.drain().collect();
        for (id, entry) in drained {
            entry.handle.close().await;
            tracing::info!(connection_id = %id, "closed on shutdown");
        }
        self.connect_locks
            .lock()
            .await
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    async fn connect_lock(&self, connection_id: &str) -> Arc<Mutex<()>> {
        self.connect_locks
            .lock()
            .await
            .entry(connection_id.to_string())
            .or_default()
            .clone()
    }

    /// Drops the id's lock from the map once no other caller holds a clone.
    async fn release_connect_lock(&self, connection_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.connect_locks.lock().await;
        let unshared = locks
            .get(connection_id)
            .is_some_and(|held| Arc::ptr_eq(held, &lock) && Arc::strong_count(&lock) == 2);
        if unshared {
            locks.remove(connection_id);
        }
    }

    async fn open_verified(
        &self,
        descriptor: &ConnectionDescriptor,
        profile: &ClientProfile,
    ) -> Result<Arc<dyn DatabaseHandle>> {
        let uri = build_connection_string(descriptor);
        tracing::debug!(uri = %redact_credentials(&uri), "opening client");

        let handle = self.connector.open(&uri, profile).await?;
        if let Err(err) = handle.ping().await {
            handle.close().await;
            return Err(err);
        }
        Ok(handle)
    }
}
