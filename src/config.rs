//! Application configuration, read from `config.toml` under the user's
//! config directory. A missing file yields the defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_DIR_NAME: &str = "mongo-workbench";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Client settings applied when opening a database handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientProfile {
    pub connect_timeout_secs: u64,
    pub server_selection_timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_pool_size: Option<u32>,
}

impl ClientProfile {
    /// Profile for long-lived registry connections.
    pub fn connect() -> Self {
        Self {
            connect_timeout_secs: 10,
            server_selection_timeout_secs: 10,
            max_pool_size: Some(10),
        }
    }

    /// Shorter profile for one-shot connection tests.
    pub fn test() -> Self {
        Self {
            connect_timeout_secs: 5,
            server_selection_timeout_secs: 5,
            max_pool_size: None,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn server_selection_timeout(&self) -> Duration {
        Duration::from_secs(self.server_selection_timeout_secs)
    }
}

/// A profile table as written in the file. Absent keys fall back to the
/// profile the table overrides.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProfileTable {
    connect_timeout_secs: Option<u64>,
    server_selection_timeout_secs: Option<u64>,
    max_pool_size: Option<u32>,
}

impl ProfileTable {
    fn over(self, base: ClientProfile) -> ClientProfile {
        ClientProfile {
            connect_timeout_secs: self.connect_timeout_secs.unwrap_or(base.connect_timeout_secs),
            server_selection_timeout_secs: self
                .server_selection_timeout_secs
                .unwrap_or(base.server_selection_timeout_secs),
            max_pool_size: self.max_pool_size.or(base.max_pool_size),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    app_name: Option<String>,
    log_level: Option<String>,
    connect: ProfileTable,
    test: ProfileTable,
}

impl From<ConfigFile> for AppConfig {
    fn from(file: ConfigFile) -> Self {
        let defaults = Self::default();
        Self {
            app_name: file.app_name.unwrap_or(defaults.app_name),
            log_level: file.log_level.unwrap_or(defaults.log_level),
            connect: file.connect.over(defaults.connect),
            test: file.test.over(defaults.test),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ConfigFile")]
pub struct AppConfig {
    pub app_name: String,
    pub log_level: String,
    pub connect: ClientProfile,
    pub test: ClientProfile,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "Mongo Workbench".to_string(),
            log_level: "info".to_string(),
            connect: ClientProfile::connect(),
            test: ClientProfile::test(),
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads from the default location, falling back to defaults when the
    /// platform has no config directory.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {}", path.display()))
            }
        };

        let mut config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        config.normalize();
        Ok(config)
    }

    fn normalize(&mut self) {
        if self.app_name.trim().is_empty() {
            self.app_name = Self::default().app_name;
        }
        if self.log_level.trim().is_empty() {
            self.log_level = Self::default().log_level;
        }
        // A zero-sized pool would stall every operation.
        if self.connect.max_pool_size == Some(0) {
            self.connect.max_pool_size = None;
        }
        if self.test.max_pool_size == Some(0) {
            self.test.max_pool_size = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.connect.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.connect.max_pool_size, Some(10));
        assert_eq!(config.test.server_selection_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn absent_fields_keep_their_defaults() {
        let file = write_config("log_level = \"debug\"\n");
        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.app_name, "Mongo Workbench");
        assert_eq!(config.test, ClientProfile::test());
    }

    #[test]
    fn profile_tables_override_timeouts() {
        let file = write_config(concat!(
            "[connect]\n",
            "connect_timeout_secs = 30\n",
            "server_selection_timeout_secs = 20\n",
            "max_pool_size = 0\n",
        ));
        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.connect.connect_timeout_secs, 30);
        assert_eq!(config.connect.server_selection_timeout_secs, 20);
        assert_eq!(config.connect.max_pool_size, None);
    }

    #[test]
    fn partial_profile_table_keeps_profile_defaults() {
        let file = write_config(
            "[connect]\nconnect_timeout_secs = 30\n\n[test]\nmax_pool_size = 3\n",
        );
        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(
            config.connect,
            ClientProfile {
                connect_timeout_secs: 30,
                ..ClientProfile::connect()
            }
        );
        assert_eq!(config.connect.max_pool_size, Some(10));
        assert_eq!(
            config.test,
            ClientProfile {
                max_pool_size: Some(3),
                ..ClientProfile::test()
            }
        );
    }

    #[test]
    fn malformed_file_reports_path() {
        let file = write_config("log_level = [");
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse"));
    }
}
