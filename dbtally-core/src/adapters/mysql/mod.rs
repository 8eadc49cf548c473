//! MySQL backend built on sqlx.
//!
//! # Module Structure
//! - `connection`: connect options and connection lifecycle
//! - `queries`: catalog and count SQL
//!
//! All statements are read-only: one catalog `SELECT` against
//! `INFORMATION_SCHEMA.TABLES` and one `SELECT COUNT(1)` per table.

pub mod connection;
pub mod queries;


use super::Backend;
use crate::Result;
use crate::descriptor::ConnectionTarget;
use crate::error::DbTallyError;
use crate::models::{SchemaFilter, TableName};
use async_trait::async_trait;
use sqlx::Row;
use sqlx::mysql::MySqlConnection;

pub use connection::connect_options;

/// MySQL implementation of [`Backend`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlBackend;

impl MySqlBackend {
    /// Creates the backend.
    pub const fn new() -> Self {
        Self
    }
}

/// Splits sqlx failures into decode problems and everything else.
fn classify(context: String, error: sqlx::Error) -> DbTallyError {
    if matches!(
        error,
        sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
    ) {
        DbTallyError::Decode {
            context,
            source: Box::new(error),
        }
    } else {
        DbTallyError::query_failed(context, error)
    }
}

#[async_trait]
impl Backend for MySqlBackend {
    type Connection = MySqlConnection;

    fn database_type(&self) -> &'static str {
        "mysql"
    }

    async fn open(&self, target: &ConnectionTarget) -> Result<MySqlConnection> {
        self.connect(target).await
    }

    async fn ping(&self, conn: &mut MySqlConnection) -> Result<()> {
        self.ping_connection(conn).await
    }

    async fn fetch_table_names(
        &self,
        conn: &mut MySqlConnection,
        filter: &SchemaFilter,
    ) -> Result<Vec<TableName>> {
        let (sql, schema) = queries::list_tables_query(filter);

        let mut query = sqlx::query(&sql);
        if let Some(schema) = schema {
            query = query.bind(schema);
        }

        let rows = query
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| classify(format!("Failed to list tables in {}", filter), e))?;

        tracing::debug!("Catalog returned {} rows", rows.len());

        rows.iter()
            .map(|row| {
                let schema: String = row
                    .try_get("TABLE_SCHEMA")
                    .map_err(|e| DbTallyError::decode_failed("TABLE_SCHEMA", None, e))?;
                let name: String = row
                    .try_get("TABLE_NAME")
                    .map_err(|e| DbTallyError::decode_failed("TABLE_NAME", None, e))?;
                Ok(TableName { schema, name })
            })
            .collect()
    }

    async fn count_rows(&self, conn: &mut MySqlConnection, table: &TableName) -> Result<u64> {
        let sql = queries::count_query(&table.name);

        let count: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| classify(format!("Failed to count rows of {}", table), e))?;

        u64::try_from(count).map_err(|e| {
            DbTallyError::decode_failed("COUNT(1)", Some(&table.to_string()), e)
        })
    }

    async fn close(&self, conn: MySqlConnection) {
        self.close_connection(conn).await;
    }
}
