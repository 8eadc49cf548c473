//! MySQL connection setup.
//!
//! One unpooled `MySqlConnection` per target: the pipeline opens a handle
//! right before use and closes it when the step is done.

use super::MySqlBackend;
use crate::Result;
use crate::descriptor::ConnectionTarget;
use crate::error::DbTallyError;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection};
use std::str::FromStr;

/// Parses driver options from the target's `mysql://` locator.
///
/// Credentials are percent-decoded by the driver. A target without a
/// password yields options without one, so passwordless accounts can log in.
///
/// # Errors
/// Returns a connection error naming the redacted target if the locator
/// cannot be built or parsed.
pub fn connect_options(target: &ConnectionTarget) -> Result<MySqlConnectOptions> {
    let url = target
        .url()
        .map_err(|e| DbTallyError::connection_failed(target.to_string(), e))?;

    let options = MySqlConnectOptions::from_str(&url)
        .map_err(|e| DbTallyError::connection_failed(target.to_string(), e))?;

    // Statement logging would echo every query at INFO level.
    Ok(options.disable_statement_logging())
}

impl MySqlBackend {
    pub(super) async fn connect(&self, target: &ConnectionTarget) -> Result<MySqlConnection> {
        tracing::debug!("Opening MySQL connection to {}", target);

        let conn = connect_options(target)?
            .connect()
            .await
            .map_err(|e| DbTallyError::connection_failed(target.to_string(), e))?;

        Ok(conn)
    }

    pub(super) async fn ping_connection(&self, conn: &mut MySqlConnection) -> Result<()> {
        conn.ping()
            .await
            .map_err(|e| DbTallyError::connection_failed("ping failed", e))
    }

    pub(super) async fn close_connection(&self, conn: MySqlConnection) {
        if let Err(e) = conn.close().await {
            tracing::warn!("Failed to close MySQL connection cleanly: {}", e);
        }
    }
}
