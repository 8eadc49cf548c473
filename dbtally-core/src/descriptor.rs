//! Connection descriptor and the per-schema targets it produces.
//!
//! The descriptor is built once per run and never mutated; every connection
//! the pipeline opens is described by a [`ConnectionTarget`] derived from it.

use crate::Result;
use crate::config::{ConnectionSettings, DEFAULT_PORT};
use crate::error::DbTallyError;
use std::fmt;
use std::net::IpAddr;
use url::Url;
use zeroize::Zeroizing;

/// Catalog namespace addressed when no schema is given.
pub const CATALOG_SCHEMA: &str = "information_schema";

/// Host, port and credentials for one run.
///
/// The password lives in a `Zeroizing` buffer and is omitted from `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    username: String,
    password: Zeroizing<String>,
    host: String,
    port: u16,
}

impl ConnectionDescriptor {
    /// Creates a descriptor; a port of 0 falls back to [`DEFAULT_PORT`].
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            username: username.into(),
            password: Zeroizing::new(password.into()),
            host: host.into(),
            port: if port == 0 { DEFAULT_PORT } else { port },
        }
    }

    /// Replaces the port when `port` is non-zero.
    #[must_use]
    pub fn with_port_override(mut self, port: u16) -> Self {
        if port != 0 {
            self.port = port;
        }
        self
    }

    /// Login user
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Server host
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Effective server port
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Produces the target for `schema`, or for the catalog namespace when
    /// `schema` is `None`.
    pub fn target(&self, schema: Option<&str>) -> ConnectionTarget {
        ConnectionTarget {
            username: self.username.clone(),
            password: self.password.clone(),
            host: self.host.clone(),
            port: self.port,
            database: schema.unwrap_or(CATALOG_SCHEMA).to_string(),
        }
    }
}

impl From<&ConnectionSettings> for ConnectionDescriptor {
    fn from(settings: &ConnectionSettings) -> Self {
        Self::new(
            settings.username.clone(),
            settings.password.clone(),
            settings.host.clone(),
            settings.port,
        )
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("username", &self.username)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

/// Locator for a single connection: descriptor fields plus the database to
/// select.
///
/// `Display` renders the redacted URL; use [`ConnectionTarget::url`] only
/// when handing the locator to a driver.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    username: String,
    password: Zeroizing<String>,
    host: String,
    port: u16,
    database: String,
}

impl ConnectionTarget {
    /// Login user
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Login password
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Server host
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Server port
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Database (schema) selected on connect
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Whether this target addresses the catalog namespace.
    pub fn is_catalog(&self) -> bool {
        self.database == CATALOG_SCHEMA
    }

    /// Full `mysql://` locator with percent-encoded credentials.
    ///
    /// # Errors
    /// Returns a configuration error if the host cannot appear in a URL.
    pub fn url(&self) -> Result<Zeroizing<String>> {
        let url = self.locator(&self.password)?;
        Ok(Zeroizing::new(url.into()))
    }

    /// Locator with the password masked, safe for logs and errors.
    pub fn redacted(&self) -> String {
        match self.locator("****") {
            Ok(url) => url.into(),
            // Invalid hosts still need a readable context in errors.
            Err(_) => format!(
                "mysql://{}@{}:{}/{}",
                self.username, self.host, self.port, self.database
            ),
        }
    }

    fn locator(&self, password: &str) -> Result<Url> {
        let invalid = || {
            DbTallyError::configuration(format!("Invalid host in connection target: {}", self.host))
        };

        let mut url = Url::parse("mysql://localhost/").map_err(|_| invalid())?;
        match self.host.parse::<IpAddr>() {
            Ok(ip) => url.set_ip_host(ip).map_err(|()| invalid())?,
            Err(_) => url.set_host(Some(&self.host)).map_err(|_| invalid())?,
        }
        url.set_port(Some(self.port)).map_err(|()| invalid())?;
        url.set_username(&self.username).map_err(|()| invalid())?;
        if !self.password.is_empty() {
            url.set_password(Some(password)).map_err(|()| invalid())?;
        }
        url.path_segments_mut()
            .map_err(|()| invalid())?
            .clear()
            .push(&self.database);

        Ok(url)
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl fmt::Debug for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConnectionTarget")
            .field(&self.redacted())
            .finish()
    }
}
