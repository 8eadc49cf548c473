//! Database backends the inventory pipeline runs against.
//!
//! The pipeline only needs a small capability set from an engine: open a
//! connection to a target, ping it, list catalog tables, count one table's
//! rows, and close the connection. Each engine implements [`Backend`] once;
//! the enumerator and counter in [`crate::inventory`] are generic over it.
//!
//! # Module Structure
//! - `mysql`: sqlx-based MySQL backend (feature `mysql`)
//! - `mock`: scripted in-memory backend (tests and feature `test-support`)

use crate::Result;
use crate::descriptor::ConnectionTarget;
use crate::models::{SchemaFilter, TableName};
use async_trait::async_trait;

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(any(test, feature = "test-support"))]
pub mod mock;

/// Capability set of a database engine.
///
/// Connections are plain owned values. Callers must hand every connection
/// they open back to [`Backend::close`], on success and on error alike.
///
/// # Errors
/// - `open` and `ping` fail with [`crate::DbTallyError::Connection`]
/// - `fetch_table_names` and `count_rows` fail with
///   [`crate::DbTallyError::Query`] or [`crate::DbTallyError::Decode`]
#[async_trait]
pub trait Backend: Send + Sync {
    /// One open database handle
    type Connection: Send;

    /// Engine identifier used in log lines
    fn database_type(&self) -> &'static str;

    /// Opens a connection to `target`.
    async fn open(&self, target: &ConnectionTarget) -> Result<Self::Connection>;

    /// Checks that an open connection is alive.
    async fn ping(&self, conn: &mut Self::Connection) -> Result<()>;

    /// Lists base tables from the catalog, narrowed by `filter` where the
    /// engine can do so in the query itself.
    ///
    /// `conn` must address the catalog namespace.
    async fn fetch_table_names(
        &self,
        conn: &mut Self::Connection,
        filter: &SchemaFilter,
    ) -> Result<Vec<TableName>>;

    /// Runs an exact count of `table`.
    ///
    /// `conn` must address `table.schema`.
    async fn count_rows(&self, conn: &mut Self::Connection, table: &TableName) -> Result<u64>;

    /// Releases a connection. Failures are logged, not returned: the handle
    /// is gone either way.
    async fn close(&self, conn: Self::Connection);
}
