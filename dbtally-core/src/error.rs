//! Error types with credential sanitization.
//!
//! Every error carries a human-readable context built from redacted
//! connection targets only. Passwords never reach an error message.

use thiserror::Error;

/// Boxed source error carried by the pipeline variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for dbtally operations.
///
/// The three pipeline kinds (`Connection`, `Query`, `Decode`) propagate
/// unchanged from the failing step up to the process boundary.
#[derive(Debug, Error)]
pub enum DbTallyError {
    /// A database handle could not be opened or did not answer a ping
    #[error("Database connection failed: {context}")]
    Connection {
        context: String,
        #[source]
        source: BoxError,
    },

    /// A catalog or count query failed
    #[error("Query failed: {context}")]
    Query {
        context: String,
        #[source]
        source: BoxError,
    },

    /// A result row could not be read into the expected fields
    #[error("Failed to decode result: {context}")]
    Decode {
        context: String,
        #[source]
        source: BoxError,
    },

    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results with `DbTallyError`
pub type Result<T> = std::result::Result<T, DbTallyError>;

/// Coarse classification of an error, used by callers that branch on the
/// failing pipeline stage without matching on every field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`DbTallyError::Connection`]
    Connection,
    /// See [`DbTallyError::Query`]
    Query,
    /// See [`DbTallyError::Decode`]
    Decode,
    /// Configuration, I/O and serialization failures
    Other,
}

impl DbTallyError {
    /// Creates a connection error with sanitized context
    pub fn connection_failed<E>(context: impl Into<String>, error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Connection {
            context: context.into(),
            source: error.into(),
        }
    }

    /// Creates a query error with context
    pub fn query_failed<E>(context: impl Into<String>, error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Query {
            context: context.into(),
            source: error.into(),
        }
    }

    /// Creates a decode error for a field that could not be read
    ///
    /// # Arguments
    /// * `field_name` - Name of the field being decoded
    /// * `table_context` - Optional table context for better error messages
    /// * `error` - The underlying decoding error
    pub fn decode_failed<E>(field_name: &str, table_context: Option<&str>, error: E) -> Self
    where
        E: Into<BoxError>,
    {
        let context = match table_context {
            Some(table) => format!("field '{}' for table '{}'", field_name, table),
            None => format!("field '{}' from catalog row", field_name),
        };
        Self::Decode {
            context,
            source: error.into(),
        }
    }

    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns the coarse kind of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Query { .. } => ErrorKind::Query,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Configuration { .. } | Self::Io { .. } | Self::Serialization { .. } => {
                ErrorKind::Other
            }
        }
    }
}
