use mongodb::error::{Error as MongoError, ErrorKind};
use thiserror::Error;

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

/// Failures surfaced to the UI by registry and query operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The identifier has no connected registry entry.
    #[error("No active connection found for '{0}'")]
    NoActiveConnection(String),

    /// Network, DNS, authentication or server selection failure.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query-level failure such as a malformed filter or payload.
    #[error("Operation error: {0}")]
    Operation(String),
}

impl BridgeError {
    pub fn operation(message: impl Into<String>) -> Self {
        Self::Operation(message.into())
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    pub fn is_no_active_connection(&self) -> bool {
        matches!(self, Self::NoActiveConnection(_))
    }
}

impl From<MongoError> for BridgeError {
    fn from(error: MongoError) -> Self {
        match error.kind.as_ref() {
            ErrorKind::Authentication { .. }
            | ErrorKind::ServerSelection { .. }
            | ErrorKind::DnsResolve { .. }
            | ErrorKind::ConnectionPoolCleared { .. }
            | ErrorKind::Io(_) => Self::Connection(error.to_string()),
            _ => Self::Operation(error.to_string()),
        }
    }
}
