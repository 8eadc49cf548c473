//! Table discovery and row counting pipeline.
//!
//! A run is two sequential steps over one [`ConnectionDescriptor`]:
//!
//! 1. [`Inventory::list_tables`] opens the catalog namespace and lists the
//!    tables selected by the [`SchemaFilter`].
//! 2. [`Inventory::count_rows`] opens schema-scoped connections and counts
//!    each table exactly.
//!
//! Both steps are all-or-nothing: the first error aborts the step and no
//! partial list is returned. Every connection a step opens is closed before
//! the step returns, whatever the outcome.

use crate::Result;
use crate::adapters::Backend;
use crate::config::Config;
use crate::descriptor::{ConnectionDescriptor, ConnectionTarget};
use crate::models::{CountStrategy, SchemaFilter, TableInfo, TableName};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, info};

/// The pipeline, generic over the database backend.
#[derive(Debug)]
pub struct Inventory<B: Backend> {
    backend: B,
    filter: SchemaFilter,
    strategy: CountStrategy,
}

impl<B: Backend> Inventory<B> {
    /// Creates a pipeline with the default filter and count strategy.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            filter: SchemaFilter::default(),
            strategy: CountStrategy::default(),
        }
    }

    /// Sets which schemas the catalog query lists.
    #[must_use]
    pub fn with_filter(mut self, filter: SchemaFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets how counting connections are opened.
    #[must_use]
    pub const fn with_strategy(mut self, strategy: CountStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// The backend this pipeline runs against
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// The active schema filter
    pub const fn filter(&self) -> &SchemaFilter {
        &self.filter
    }

    /// The active count strategy
    pub const fn strategy(&self) -> CountStrategy {
        self.strategy
    }

    /// Runs the whole pipeline for `config`.
    ///
    /// A non-zero `port_override` replaces the configured port before any
    /// connection is made.
    ///
    /// # Errors
    /// Returns the first error from enumeration or counting, unchanged.
    pub async fn run(&self, config: &Config, port_override: u16) -> Result<Vec<TableInfo>> {
        let descriptor =
            ConnectionDescriptor::from(&config.connection).with_port_override(port_override);
        self.run_with(&descriptor).await
    }

    /// Runs the pipeline against an already resolved descriptor.
    ///
    /// # Errors
    /// Returns the first error from enumeration or counting, unchanged.
    pub async fn run_with(&self, descriptor: &ConnectionDescriptor) -> Result<Vec<TableInfo>> {
        let start_time = Instant::now();

        let tables = self.list_tables(descriptor).await?;
        let counted = self.count_rows(descriptor, &tables).await?;

        info!(
            "Counted rows of {} tables in {:.2}s",
            counted.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(counted)
    }

    /// Opens and pings the catalog namespace, then closes it again.
    ///
    /// # Errors
    /// Returns a connection error if the open or the ping fails.
    pub async fn test_connection(&self, descriptor: &ConnectionDescriptor) -> Result<()> {
        let target = descriptor.target(None);
        let conn = self.open_checked(&target).await?;
        self.backend.close(conn).await;
        info!("Connection to {} successful", target);
        Ok(())
    }

    /// Lists the tables selected by the filter, in catalog order.
    ///
    /// Tables already returned are not repeated.
    ///
    /// # Errors
    /// - `Connection` if the catalog cannot be opened or pinged
    /// - `Query` or `Decode` if the catalog query fails
    pub async fn list_tables(&self, descriptor: &ConnectionDescriptor) -> Result<Vec<TableName>> {
        let target = descriptor.target(None);
        info!(
            "Listing tables in {} on {} ({})",
            self.filter,
            target,
            self.backend.database_type()
        );

        let mut conn = self.open_checked(&target).await?;
        let fetched = self.backend.fetch_table_names(&mut conn, &self.filter).await;
        self.backend.close(conn).await;

        let mut seen = HashSet::new();
        let tables: Vec<TableName> = fetched?
            .into_iter()
            .filter(|table| self.filter.accepts(&table.schema))
            .filter(|table| seen.insert(table.clone()))
            .collect();

        info!("Found {} tables", tables.len());
        Ok(tables)
    }

    /// Counts the rows of every table, preserving input order.
    ///
    /// # Errors
    /// Returns the first failure (`Connection`, `Query` or `Decode`); the
    /// remaining tables are not counted.
    pub async fn count_rows(
        &self,
        descriptor: &ConnectionDescriptor,
        tables: &[TableName],
    ) -> Result<Vec<TableInfo>> {
        debug!("Counting {} tables ({:?})", tables.len(), self.strategy);
        match self.strategy {
            CountStrategy::PerSchema => self.count_per_schema(descriptor, tables).await,
            CountStrategy::PerTable => self.count_per_table(descriptor, tables).await,
        }
    }

    async fn count_per_table(
        &self,
        descriptor: &ConnectionDescriptor,
        tables: &[TableName],
    ) -> Result<Vec<TableInfo>> {
        let mut counted = Vec::with_capacity(tables.len());

        for table in tables {
            let mut conn = self
                .backend
                .open(&descriptor.target(Some(&table.schema)))
                .await?;
            let row_count = self.backend.count_rows(&mut conn, table).await;
            self.backend.close(conn).await;

            let row_count = row_count?;
            debug!("{}: {} rows", table, row_count);
            counted.push(TableInfo::new(table.clone(), row_count));
        }

        Ok(counted)
    }

    async fn count_per_schema(
        &self,
        descriptor: &ConnectionDescriptor,
        tables: &[TableName],
    ) -> Result<Vec<TableInfo>> {
        let mut open = HashMap::new();
        let outcome = self.count_reusing(descriptor, tables, &mut open).await;

        debug!("Closing {} schema connections", open.len());
        for (_, conn) in open.drain() {
            self.backend.close(conn).await;
        }

        outcome
    }

    async fn count_reusing(
        &self,
        descriptor: &ConnectionDescriptor,
        tables: &[TableName],
        open: &mut HashMap<String, B::Connection>,
    ) -> Result<Vec<TableInfo>> {
        let mut counted = Vec::with_capacity(tables.len());

        for table in tables {
            let conn = match open.entry(table.schema.clone()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let conn = self
                        .backend
                        .open(&descriptor.target(Some(&table.schema)))
                        .await?;
                    entry.insert(conn)
                }
            };

            let row_count = self.backend.count_rows(conn, table).await?;
            debug!("{}: {} rows", table, row_count);
            counted.push(TableInfo::new(table.clone(), row_count));
        }

        Ok(counted)
    }

    /// Opens `target` and pings it, closing the handle again if the ping
    /// fails.
    async fn open_checked(&self, target: &ConnectionTarget) -> Result<B::Connection> {
        let mut conn = self.backend.open(target).await?;
        if let Err(e) = self.backend.ping(&mut conn).await {
            self.backend.close(conn).await;
            return Err(e);
        }
        Ok(conn)
    }
}

#[cfg(test)]
mod tests;
