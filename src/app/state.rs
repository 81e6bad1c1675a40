use std::sync::Arc;

use crate::app::bridge::Bridge;
use crate::config::AppConfig;
use crate::mongo::client::{Connector, MongoConnector};
use crate::mongo::registry::ConnectionRegistry;

/// Managed state handed to every desktop command. Owns the single registry
/// for the lifetime of the process.
pub struct AppState {
    pub bridge: Bridge,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_connector(config, Arc::new(MongoConnector::new(config.app_name.clone())))
    }

    pub fn with_connector(config: &AppConfig, connector: Arc<dyn Connector>) -> Self {
        let registry =
            ConnectionRegistry::new(connector, config.connect.clone(), config.test.clone());
        Self {
            bridge: Bridge::new(Arc::new(registry)),
        }
    }
}
