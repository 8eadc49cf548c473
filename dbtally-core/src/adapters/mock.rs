//! In-memory backend for exercising the pipeline without a server.
//!
//! Records every open and close so tests can assert connection parity.
//! Available to other crates with the `test-support` feature.

use super::Backend;
use crate::Result;
use crate::descriptor::ConnectionTarget;
use crate::error::DbTallyError;
use crate::models::{SchemaFilter, TableName};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Handle returned by [`MockBackend::open`]
#[derive(Debug)]
pub struct MockConnection {
    database: String,
}

/// Scripted backend that records what the pipeline asks of it.
#[derive(Debug, Default)]
pub struct MockBackend {
    catalog: Vec<TableName>,
    counts: HashMap<TableName, i64>,
    refused: HashSet<String>,
    fail_ping: bool,
    fail_catalog_query: bool,
    fold_schema_case: bool,
    opened: AtomicUsize,
    closed: AtomicUsize,
    targets: Mutex<Vec<ConnectionTarget>>,
    counted: Mutex<Vec<TableName>>,
}

impl MockBackend {
    /// Creates a backend with an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table to the catalog with `rows` rows.
    pub fn with_table(mut self, schema: &str, name: &str, rows: i64) -> Self {
        let table = TableName::new(schema, name);
        self.catalog.push(table.clone());
        self.counts.insert(table, rows);
        self
    }

    /// Lists a table in the catalog that fails to count, as if dropped
    /// after enumeration.
    pub fn with_dropped_table(mut self, schema: &str, name: &str) -> Self {
        self.catalog.push(TableName::new(schema, name));
        self
    }

    /// Refuses connections to `database`.
    pub fn refusing(mut self, database: &str) -> Self {
        self.refused.insert(database.to_string());
        self
    }

    /// Fails every ping.
    pub fn failing_ping(mut self) -> Self {
        self.fail_ping = true;
        self
    }

    /// Fails the catalog query.
    pub fn failing_catalog_query(mut self) -> Self {
        self.fail_catalog_query = true;
        self
    }

    /// Matches schema names case-insensitively, like a server running with
    /// `lower_case_table_names` set.
    pub fn folding_schema_case(mut self) -> Self {
        self.fold_schema_case = true;
        self
    }

    /// Connections opened so far
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Connections closed so far
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Every target opened, in order
    pub fn targets(&self) -> Vec<ConnectionTarget> {
        self.targets.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Every table counted, in order
    pub fn counted(&self) -> Vec<TableName> {
        self.counted.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

fn refused() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused")
}

#[async_trait]
impl Backend for MockBackend {
    type Connection = MockConnection;

    fn database_type(&self) -> &'static str {
        "mock"
    }

    async fn open(&self, target: &ConnectionTarget) -> Result<MockConnection> {
        if self.refused.contains(target.database()) {
            return Err(DbTallyError::connection_failed(target.to_string(), refused()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.targets.lock().unwrap_or_else(PoisonError::into_inner).push(target.clone());
        Ok(MockConnection {
            database: target.database().to_string(),
        })
    }

    async fn ping(&self, _conn: &mut MockConnection) -> Result<()> {
        if self.fail_ping {
            return Err(DbTallyError::connection_failed("ping failed", refused()));
        }
        Ok(())
    }

    async fn fetch_table_names(
        &self,
        conn: &mut MockConnection,
        filter: &SchemaFilter,
    ) -> Result<Vec<TableName>> {
        if conn.database != crate::descriptor::CATALOG_SCHEMA {
            return Err(DbTallyError::query_failed(
                "catalog query on a non-catalog connection",
                conn.database.clone(),
            ));
        }
        if self.fail_catalog_query {
            return Err(DbTallyError::query_failed(
                "Failed to list tables",
                "SELECT command denied",
            ));
        }
        Ok(self
            .catalog
            .iter()
            .filter(|t| match filter {
                SchemaFilter::Only(schema) if self.fold_schema_case => {
                    t.schema.eq_ignore_ascii_case(schema)
                }
                SchemaFilter::Only(schema) => &t.schema == schema,
                SchemaFilter::All { .. } => true,
            })
            .cloned()
            .collect())
    }

    async fn count_rows(&self, conn: &mut MockConnection, table: &TableName) -> Result<u64> {
        if conn.database != table.schema {
            return Err(DbTallyError::query_failed(
                format!("count of {} on connection to '{}'", table, conn.database),
                "wrong schema",
            ));
        }
        self.counted.lock().unwrap_or_else(PoisonError::into_inner).push(table.clone());
        let count = self.counts.get(table).copied().ok_or_else(|| {
            DbTallyError::query_failed(
                format!("Failed to count rows of {}", table),
                format!("Table '{}' doesn't exist", table),
            )
        })?;
        u64::try_from(count)
            .map_err(|e| DbTallyError::decode_failed("COUNT(1)", Some(&table.to_string()), e))
    }

    async fn close(&self, _conn: MockConnection) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}
