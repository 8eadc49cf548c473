//! SQL text issued by the MySQL backend.

use crate::models::SchemaFilter;

// Cast to CHAR to avoid VARBINARY columns in MySQL 8.0+ catalogs.
const TABLES_SELECT: &str = "SELECT CAST(TABLE_SCHEMA AS CHAR) AS TABLE_SCHEMA, \
     CAST(TABLE_NAME AS CHAR) AS TABLE_NAME \
     FROM INFORMATION_SCHEMA.TABLES \
     WHERE TABLE_TYPE = 'BASE TABLE'";

const TABLES_ORDER: &str = " ORDER BY TABLE_SCHEMA, TABLE_NAME";

/// Catalog query for `filter`, and whether it takes the schema as a bound
/// parameter.
pub fn list_tables_query(filter: &SchemaFilter) -> (String, Option<&str>) {
    match filter {
        SchemaFilter::Only(schema) => (
            format!("{} AND TABLE_SCHEMA = ?{}", TABLES_SELECT, TABLES_ORDER),
            Some(schema.as_str()),
        ),
        SchemaFilter::All { .. } => (format!("{}{}", TABLES_SELECT, TABLES_ORDER), None),
    }
}

/// Quotes an identifier with backticks, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Exact count of one table; the connection already selects its schema.
pub fn count_query(table: &str) -> String {
    format!("SELECT COUNT(1) FROM {}", quote_identifier(table))
}
