use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_PORT: u16 = 27017;

/// User-authored description of how to reach a server. Owned by the UI and
/// passed by value into the registry on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDescriptor {
    pub id: String,
    pub name: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub ssl: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
    #[serde(default)]
    pub is_connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_connected: Option<DateTime<Utc>>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl ConnectionDescriptor {
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            host: host.into(),
            port,
            database: None,
            username: None,
            password: None,
            ssl: false,
            auth_database: None,
            connection_string: None,
            is_connected: false,
            last_connected: None,
            created_at: Utc::now(),
        }
    }

    /// Username and password, only when both are non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        non_empty(&self.username).zip(non_empty(&self.password))
    }

    pub fn override_uri(&self) -> Option<&str> {
        non_empty(&self.connection_string)
    }

    pub fn database_name(&self) -> Option<&str> {
        non_empty(&self.database)
    }

    pub fn auth_database_name(&self) -> Option<&str> {
        non_empty(&self.auth_database)
    }
}
