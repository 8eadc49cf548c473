//! Inventory records and the options that shape a run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Schemas MySQL ships with; skipped by [`SchemaFilter::All`] unless asked for.
pub const SYSTEM_SCHEMAS: [&str; 4] = ["information_schema", "mysql", "performance_schema", "sys"];

/// Identifies one table on a server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableName {
    /// Schema (MySQL database) holding the table
    pub schema: String,
    /// Table name within the schema
    pub name: String,
}

impl TableName {
    /// Creates a table name from its schema and name.
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// A table together with its exact row count.
///
/// Serialized as `{"schema": .., "name": .., "num": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    /// Schema (MySQL database) holding the table
    pub schema: String,
    /// Table name within the schema
    pub name: String,
    /// Row count captured by `COUNT(1)`
    #[serde(rename = "num")]
    pub row_count: u64,
}

impl TableInfo {
    /// Combines an enumerated table with its count.
    pub fn new(table: TableName, row_count: u64) -> Self {
        Self {
            schema: table.schema,
            name: table.name,
            row_count,
        }
    }
}

/// Which schemas the catalog query lists tables from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaFilter {
    /// Only tables of the named schema
    Only(String),
    /// Tables of every schema visible to the connection
    All {
        /// Also list `information_schema`, `mysql`, `performance_schema`, `sys`
        include_system: bool,
    },
}

impl SchemaFilter {
    /// Builds a filter from an optional schema name; `None` means all
    /// non-system schemas.
    pub fn from_schema(schema: Option<&str>) -> Self {
        match schema {
            Some(name) => Self::Only(name.to_string()),
            None => Self::All {
                include_system: false,
            },
        }
    }

    /// Whether a catalog row in `schema` is kept.
    ///
    /// `Only` is matched by the catalog query itself, using the server's
    /// own name comparison, so every row it returns is kept. `All` drops
    /// system schemas unless they were asked for.
    pub fn accepts(&self, schema: &str) -> bool {
        match self {
            Self::Only(_) => true,
            Self::All { include_system } => {
                *include_system || !SYSTEM_SCHEMAS.contains(&schema.to_lowercase().as_str())
            }
        }
    }
}

impl Default for SchemaFilter {
    fn default() -> Self {
        Self::Only(crate::config::DEFAULT_SCHEMA.to_string())
    }
}

impl fmt::Display for SchemaFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Only(name) => write!(f, "schema '{}'", name),
            Self::All {
                include_system: true,
            } => f.write_str("all schemas"),
            Self::All {
                include_system: false,
            } => f.write_str("all non-system schemas"),
        }
    }
}

/// How the row counter obtains schema-scoped connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountStrategy {
    /// One connection per distinct schema, reused for that schema's tables
    #[default]
    PerSchema,
    /// A fresh connection opened and closed around every count
    PerTable,
}
