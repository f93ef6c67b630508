//! redshift-introspect - Main entry point.
//!
//! Prints, as JSON on stdout, what the query engine sees of a Redshift
//! cluster: tables, foreign keys, fields with canonical types, and the
//! dialect's connection form.

use clap::Parser;
use redshift_dialect::config::{CatalogCommand, Command, Config};
use redshift_dialect::db::CatalogIntrospector;
use redshift_dialect::error::{DialectError, DialectResult};
use redshift_dialect::models::{ConnectionConfig, ConnectionDescriptor, TableRef};
use redshift_dialect::{Redshift, SqlDialect};
use serde::Serialize;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    if !config.enable_logs {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();
    init_tracing(&config);

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Hint: {}", suggestion);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config) -> DialectResult<()> {
    let dialect = Redshift;

    match &config.command {
        Command::MapType { name } => print_json(&MappedType {
            native_type: name,
            canonical_type: dialect.map_type(name).as_str(),
        }),
        Command::FieldsSpec => print_json(&dialect.describe()),
        Command::ConfigSchema => print_json(&ConnectionConfig::json_schema()),
        Command::Descriptor => {
            let descriptor = dialect.connection_descriptor(&config.connection_config()?);
            print_json(&DescriptorOutput {
                url: descriptor.url(),
                descriptor: &descriptor,
            })
        }
        Command::Catalog(command) => {
            let pool = connect(config, &dialect).await?;
            let result = run_catalog(command, &dialect.introspector(&pool)).await;
            pool.close().await;
            result
        }
    }
}

async fn run_catalog(
    command: &CatalogCommand,
    introspector: &CatalogIntrospector<'_, PgPool>,
) -> DialectResult<()> {
    match command {
        CatalogCommand::Tables => print_json(&introspector.list_tables().await?),
        CatalogCommand::ForeignKeys { schema, table } => {
            let table = TableRef::new(schema.as_str(), table.as_str());
            print_json(&introspector.list_foreign_keys(&table).await?)
        }
        CatalogCommand::Fields { schema, table } => {
            let table = TableRef::new(schema.as_str(), table.as_str());
            print_json(&introspector.describe_fields(&table).await?)
        }
        CatalogCommand::Graph { concurrency } => {
            print_json(&introspector.foreign_key_graph(*concurrency).await?)
        }
    }
}

async fn connect(config: &Config, dialect: &Redshift) -> DialectResult<PgPool> {
    let descriptor = dialect.connection_descriptor(&config.connection_config()?);
    if descriptor.tunnel.is_some() {
        return Err(DialectError::configuration(
            "tunnel-host",
            "this tool does not open SSH tunnels; forward a local port and point --host at it",
        ));
    }

    info!(
        host = %descriptor.host,
        port = descriptor.port,
        database = %descriptor.database,
        "Connecting to Redshift"
    );

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.connect_timeout_duration())
        .connect_with(descriptor.connect_options())
        .await
        .map_err(|e| DialectError::from(e).context("connect"))
}

#[derive(Serialize)]
struct MappedType<'a> {
    native_type: &'a str,
    canonical_type: &'static str,
}

#[derive(Serialize)]
struct DescriptorOutput<'a> {
    url: String,
    #[serde(flatten)]
    descriptor: &'a ConnectionDescriptor,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> DialectResult<()> {
    let output = serde_json::to_string_pretty(value)
        .map_err(|e| DialectError::invalid_input(format!("failed to render output: {}", e)))?;
    println!("{}", output);
    Ok(())
}
