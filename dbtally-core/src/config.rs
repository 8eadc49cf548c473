//! Run configuration loaded from a JSON file.
//!
//! The file mirrors [`Config`]:
//!
//! ```json
//! {
//!   "connection": {
//!     "username": "root",
//!     "password": "password",
//!     "host": "127.0.0.1",
//!     "port": 3306
//!   },
//!   "schema": "test"
//! }
//! ```
//!
//! Missing keys take their defaults, so `{}` is a valid config.
//! `"schema": null` lists every non-system schema.

use crate::Result;
use crate::error::DbTallyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Default MySQL port
pub const DEFAULT_PORT: u16 = 3306;

/// Schema the catalog query is restricted to unless configured otherwise
pub const DEFAULT_SCHEMA: &str = "test";

/// Connection section of the config file.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Login user
    pub username: String,
    /// Login password
    pub password: String,
    /// Server host name or address
    pub host: String,
    /// Server port; 0 falls back to [`DEFAULT_PORT`]
    pub port: u16,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            username: "root".to_string(),
            password: "password".to_string(),
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("username", &self.username)
            .field("password", &"****")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

/// Top-level config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Server to inventory
    pub connection: ConnectionSettings,
    /// Schema to list tables from; `None` lists all non-system schemas
    pub schema: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection: ConnectionSettings::default(),
            schema: Some(DEFAULT_SCHEMA.to_string()),
        }
    }
}

impl Config {
    /// Loads the config from `path`, or returns the defaults when no path is
    /// given.
    ///
    /// # Errors
    /// Returns `Io` if the file cannot be read and `Serialization` if it is
    /// not valid config JSON.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            tracing::debug!("No config file given, using defaults");
            return Ok(Self::default());
        };

        let contents = std::fs::read_to_string(path).map_err(|e| DbTallyError::Io {
            context: format!("Failed to read config file {}", path.display()),
            source: e,
        })?;

        let config = Self::from_json(&contents).map_err(|e| match e {
            DbTallyError::Serialization { source, .. } => DbTallyError::Serialization {
                context: format!("Invalid config file {}", path.display()),
                source,
            },
            other => other,
        })?;

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parses a config from its JSON text.
    ///
    /// # Errors
    /// Returns `Serialization` if the text is not valid config JSON.
    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).map_err(|e| DbTallyError::Serialization {
            context: "Invalid config JSON".to_string(),
            source: e,
        })
    }

    /// Renders the config as indented JSON, as printed by
    /// `dbtally generate-config-json`.
    ///
    /// # Errors
    /// Returns `Serialization` if encoding fails.
    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| DbTallyError::Serialization {
            context: "Failed to encode config".to_string(),
            source: e,
        })
    }
}
