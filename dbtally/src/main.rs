//! MySQL table inventory tool.
//!
//! Connects to a MySQL server, lists the tables visible through
//! `INFORMATION_SCHEMA` and prints each table's exact row count as JSON.
//!
//! On any failure the error is written to stderr as a single line and the
//! process exits non-zero without printing JSON.

use clap::Parser;
use dbtally::output::write_json;
use dbtally::{Cli, Command, ConnectArgs, resolve_config, run};
use dbtally_core::{Config, ConnectionDescriptor, Inventory, MySqlBackend, init_logging};
use std::process::ExitCode;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.global.verbose, cli.global.quiet) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let outcome = match &cli.command {
        Command::Run(args) => run(MySqlBackend::new(), args, &mut std::io::stdout())
            .await
            .map(|tables| info!("Inventory of {} tables complete", tables.len())),
        Command::GenerateConfigJson => generate_config_json(),
        Command::Test(args) => test_connection(args).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Prints the default config file
fn generate_config_json() -> anyhow::Result<()> {
    let json = Config::default().to_pretty_json()?;
    write_json(&json, None, &mut std::io::stdout())
}

/// Tests catalog connectivity without counting anything
async fn test_connection(args: &ConnectArgs) -> anyhow::Result<()> {
    let config = resolve_config(args)?;
    let descriptor = ConnectionDescriptor::from(&config.connection).with_port_override(args.port);

    Inventory::new(MySqlBackend::new())
        .test_connection(&descriptor)
        .await?;

    println!(
        "Connection to {}:{} successful",
        descriptor.host(),
        descriptor.port()
    );
    Ok(())
}
