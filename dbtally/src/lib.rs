//! Library module for dbtally
//!
//! Holds the CLI definition and the glue that turns parsed arguments into a
//! core [`Config`] and [`Inventory`]. The binary entry point is in main.rs.

pub mod output;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dbtally_core::{Backend, Config, CountStrategy, Inventory, SchemaFilter, TableInfo};
use output::{render_inventory, write_json};
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// CLI argument structure
#[derive(Debug, Parser)]
#[command(name = "dbtally")]
#[command(about = "Inventory MySQL tables with exact row counts")]
#[command(version)]
#[command(arg_required_else_help = true)]
#[command(long_about = "
dbtally - MySQL table inventory

Lists the tables visible through INFORMATION_SCHEMA and counts the rows of
each one with SELECT COUNT(1). The result is printed as a JSON array of
{\"schema\", \"name\", \"num\"} objects, sorted by schema then table name.

Nothing is printed to stdout when any step fails; the error goes to stderr
and the exit status is non-zero.

EXAMPLES:
  dbtally generate-config-json > dbtally.json
  dbtally run --config dbtally.json
  dbtally run --config dbtally.json --port 3307 --all-schemas --pretty
  DBTALLY_PASSWORD=secret dbtally test --config dbtally.json
")]
pub struct Cli {
    /// Flags accepted by every command
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Count the rows of every listed table and print the inventory
    Run(RunArgs),
    /// Print the default config file as JSON
    GenerateConfigJson,
    /// Check that the catalog can be reached with the configured credentials
    Test(ConnectArgs),
}

/// Flags shared by every command that talks to the server
#[derive(Debug, Clone, Args)]
pub struct ConnectArgs {
    /// Path of the JSON config file
    #[arg(long, value_name = "FILE", help = "Path of config file (defaults apply when omitted)")]
    pub config: Option<PathBuf>,

    /// Port override; 0 keeps the configured port
    #[arg(long, default_value_t = 0, help = "Port (0 keeps the configured port)")]
    pub port: u16,

    /// Password override
    #[arg(
        long,
        env = "DBTALLY_PASSWORD",
        hide_env_values = true,
        help = "Password override (prefer the DBTALLY_PASSWORD environment variable)"
    )]
    pub password: Option<String>,
}

/// Flags of the `run` command
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Server and config selection
    #[command(flatten)]
    pub connect: ConnectArgs,

    /// Restrict the inventory to one schema
    #[arg(long, value_name = "NAME", conflicts_with = "all_schemas")]
    pub schema: Option<String>,

    /// List tables of every schema
    #[arg(long, help = "List tables of every schema instead of a single one")]
    pub all_schemas: bool,

    /// Include system schemas when listing every schema
    #[arg(
        long,
        conflicts_with = "schema",
        help = "Include information_schema, mysql, performance_schema and sys"
    )]
    pub include_system_schemas: bool,

    /// Open a fresh connection for every count
    #[arg(long, help = "Open a new connection per table instead of one per schema")]
    pub connection_per_table: bool,

    /// Output file path
    #[arg(short, long, value_name = "FILE", help = "Write the JSON to FILE instead of stdout")]
    pub output: Option<PathBuf>,

    /// Pretty-print the JSON
    #[arg(long, help = "Indent the JSON output")]
    pub pretty: bool,
}

/// Logging flags accepted by every command
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all logs except errors")]
    pub quiet: bool,
}

/// Loads the config file and applies command-line overrides that belong in
/// the config itself (the password). The port override is applied by the
/// pipeline.
///
/// # Errors
/// Returns an error if the config file cannot be read or parsed.
pub fn resolve_config(args: &ConnectArgs) -> anyhow::Result<Config> {
    let mut config = Config::load(args.config.as_deref()).with_context(|| match &args.config {
        Some(path) => format!("loading config from {}", path.display()),
        None => "loading default config".to_string(),
    })?;

    if let Some(password) = &args.password {
        config.connection.password.clone_from(password);
    }

    Ok(config)
}

/// Resolves the schema filter: command-line flags win over the config file.
pub fn schema_filter(args: &RunArgs, config: &Config) -> SchemaFilter {
    if args.all_schemas {
        return SchemaFilter::All {
            include_system: args.include_system_schemas,
        };
    }

    match args.schema.as_deref().or(config.schema.as_deref()) {
        Some(schema) => SchemaFilter::Only(schema.to_string()),
        None => SchemaFilter::All {
            include_system: args.include_system_schemas,
        },
    }
}

/// Count strategy selected on the command line.
pub const fn count_strategy(args: &RunArgs) -> CountStrategy {
    if args.connection_per_table {
        CountStrategy::PerTable
    } else {
        CountStrategy::PerSchema
    }
}

/// Builds the pipeline for `run`.
pub fn build_inventory<B: Backend>(backend: B, args: &RunArgs, config: &Config) -> Inventory<B> {
    Inventory::new(backend)
        .with_filter(schema_filter(args, config))
        .with_strategy(count_strategy(args))
}

/// Runs the pipeline against `backend` and writes the inventory.
///
/// The JSON goes to `--output` when given, otherwise to `stdout`. Nothing is
/// written unless every listed table was counted.
///
/// # Errors
/// Returns the first config, pipeline or output error.
pub async fn run<B: Backend, W: Write>(
    backend: B,
    args: &RunArgs,
    stdout: &mut W,
) -> anyhow::Result<Vec<TableInfo>> {
    let config = resolve_config(&args.connect)?;
    let inventory = build_inventory(backend, args, &config);
    debug!(
        "Inventory of {} with {:?} connections",
        inventory.filter(),
        inventory.strategy()
    );

    let tables = inventory.run(&config, args.connect.port).await?;
    let json = render_inventory(&tables, args.pretty)?;
    write_json(&json, args.output.as_deref(), stdout)?;

    Ok(tables)
}
