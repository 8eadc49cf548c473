//! JSON output of the inventory.
//!
//! The document is rendered in full before anything is written, so a failed
//! run never leaves partial JSON behind.

use anyhow::Context;
use dbtally_core::TableInfo;
use std::io::Write;
use std::path::Path;

/// Renders the inventory as a JSON array, compact or indented.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn render_inventory(tables: &[TableInfo], pretty: bool) -> anyhow::Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(tables)
    } else {
        serde_json::to_string(tables)
    };
    json.context("serializing table inventory")
}

/// Writes the rendered document to `output`, or to `stdout` when `None`.
///
/// # Errors
/// Returns an error if the file or stdout cannot be written.
pub fn write_json<W: Write>(
    json: &str,
    output: Option<&Path>,
    stdout: &mut W,
) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", json))
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => {
            writeln!(stdout, "{}", json).context("writing to stdout")?;
            stdout.flush().context("flushing stdout")?;
        }
    }
    Ok(())
}
