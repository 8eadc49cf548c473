//! Core of dbtally: table discovery and exact row counting.
//!
//! This crate enumerates the tables a MySQL connection can see and counts
//! the rows of each one, producing a list of [`TableInfo`] records ready to
//! be serialized.
//!
//! # Guarantees
//! - Read-only: only catalog `SELECT`s and `SELECT COUNT(1)` are issued
//! - All-or-nothing: any failure aborts the run with no partial result
//! - Every connection opened is closed before its step returns
//! - Passwords never appear in logs, errors or `Debug` output
//!
//! # Architecture
//! - [`adapters::Backend`] is the engine capability set; MySQL is the only
//!   production implementation
//! - [`inventory::Inventory`] drives enumeration then counting over a backend
//! - [`config::Config`] is the explicit run configuration threaded into it

pub mod adapters;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod inventory;
pub mod logging;
pub mod models;

// Re-export commonly used types
pub use adapters::Backend;
#[cfg(feature = "mysql")]
pub use adapters::mysql::MySqlBackend;
pub use config::{Config, ConnectionSettings};
pub use descriptor::{ConnectionDescriptor, ConnectionTarget};
pub use error::{DbTallyError, ErrorKind, Result};
pub use inventory::Inventory;
pub use logging::init_logging;
pub use models::{CountStrategy, SchemaFilter, TableInfo, TableName};
