//! Configuration handling for the `redshift-introspect` binary.
//!
//! Every flag can also be supplied through a `REDSHIFT_*` environment variable.

use crate::error::{DialectError, DialectResult};
use crate::models::{
    ConnectionConfig, DEFAULT_REDSHIFT_PORT, DEFAULT_TUNNEL_PORT, TunnelAuth, TunnelConfig,
};
use clap::{Parser, Subcommand};
use std::time::Duration;

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 4;
pub const DEFAULT_GRAPH_CONCURRENCY: usize = 4;
pub const DEFAULT_SCHEMA: &str = "public";

/// Configuration for the Redshift introspection tool.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "redshift-introspect",
    about = "Inspect a Redshift catalog the way the query engine sees it",
    version,
    author
)]
pub struct Config {
    /// Cluster endpoint host
    #[arg(long, env = "REDSHIFT_HOST")]
    pub host: Option<String>,

    /// Cluster port
    #[arg(long, default_value_t = DEFAULT_REDSHIFT_PORT, env = "REDSHIFT_PORT")]
    pub port: u16,

    /// Database name
    #[arg(long = "db", env = "REDSHIFT_DB")]
    pub database: Option<String>,

    /// Database username
    #[arg(short, long, env = "REDSHIFT_USER")]
    pub user: Option<String>,

    /// Database password
    #[arg(long, env = "REDSHIFT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Extra driver options, e.g. "SocketTimeout=0&loginTimeout=30"
    #[arg(long, env = "REDSHIFT_ADDITIONAL_OPTIONS")]
    pub additional_options: Option<String>,

    /// SSH tunnel host
    #[arg(long, env = "REDSHIFT_TUNNEL_HOST")]
    pub tunnel_host: Option<String>,

    /// SSH tunnel port
    #[arg(long, default_value_t = DEFAULT_TUNNEL_PORT, env = "REDSHIFT_TUNNEL_PORT")]
    pub tunnel_port: u16,

    /// SSH tunnel username
    #[arg(long, env = "REDSHIFT_TUNNEL_USER")]
    pub tunnel_user: Option<String>,

    /// SSH tunnel password
    #[arg(long, env = "REDSHIFT_TUNNEL_PASS", hide_env_values = true)]
    pub tunnel_pass: Option<String>,

    /// SSH private key (takes precedence over the tunnel password)
    #[arg(long, env = "REDSHIFT_TUNNEL_PRIVATE_KEY", hide_env_values = true)]
    pub tunnel_private_key: Option<String>,

    /// Connection timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS,
        env = "REDSHIFT_CONNECT_TIMEOUT"
    )]
    pub connect_timeout: u64,

    /// Maximum pooled connections
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_CONNECTIONS,
        env = "REDSHIFT_MAX_CONNECTIONS"
    )]
    pub max_connections: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "REDSHIFT_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "REDSHIFT_JSON_LOGS")]
    pub json_logs: bool,

    /// Enable logging output on stderr (stdout carries only results)
    #[arg(long, env = "REDSHIFT_ENABLE_LOGS")]
    pub enable_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// What to print.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    #[command(flatten)]
    Catalog(CatalogCommand),

    /// Print the connection descriptor (password excluded)
    Descriptor,

    /// Map a native type name to its canonical type
    MapType {
        /// Native type name, e.g. "character varying(256)"
        name: String,
    },

    /// Print the dialect's connection fields and time settings as JSON
    FieldsSpec,

    /// Print the JSON schema of the connection configuration
    ConfigSchema,
}

/// Commands that query the catalog of a live cluster.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum CatalogCommand {
    /// List user tables
    Tables,

    /// List the outgoing foreign keys of a table
    ForeignKeys {
        #[arg(long, default_value = DEFAULT_SCHEMA)]
        schema: String,
        #[arg(long)]
        table: String,
    },

    /// Describe the columns of a table
    Fields {
        #[arg(long, default_value = DEFAULT_SCHEMA)]
        schema: String,
        #[arg(long)]
        table: String,
    },

    /// List every table with its foreign keys
    Graph {
        /// Foreign-key queries in flight at once
        #[arg(long, default_value_t = DEFAULT_GRAPH_CONCURRENCY)]
        concurrency: usize,
    },
}

impl Config {
    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            host: None,
            port: DEFAULT_REDSHIFT_PORT,
            database: None,
            user: None,
            password: None,
            additional_options: None,
            tunnel_host: None,
            tunnel_port: DEFAULT_TUNNEL_PORT,
            tunnel_user: None,
            tunnel_pass: None,
            tunnel_private_key: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            log_level: "info".to_string(),
            json_logs: false,
            enable_logs: false,
            command: Command::FieldsSpec,
        }
    }

    /// Build a validated [`ConnectionConfig`] from the flags.
    pub fn connection_config(&self) -> DialectResult<ConnectionConfig> {
        let mut config = ConnectionConfig::new(
            required(&self.host, "host")?,
            self.port,
            required(&self.database, "db")?,
            required(&self.user, "user")?,
            self.password.clone().unwrap_or_default(),
        );
        if let Some(options) = &self.additional_options {
            config = config.with_additional_options(options.as_str());
        }
        if let Some(tunnel) = self.tunnel_config()? {
            config = config.with_tunnel(tunnel);
        }
        config.validate()?;
        Ok(config)
    }

    fn tunnel_config(&self) -> DialectResult<Option<TunnelConfig>> {
        let Some(host) = &self.tunnel_host else {
            return Ok(None);
        };
        let auth = match (&self.tunnel_private_key, &self.tunnel_pass) {
            (Some(key), _) => TunnelAuth::PrivateKey(key.clone()),
            (None, Some(pass)) => TunnelAuth::Password(pass.clone()),
            (None, None) => {
                return Err(DialectError::configuration(
                    "tunnel-pass",
                    "an SSH tunnel needs a password or a private key",
                ));
            }
        };
        let user = required(&self.tunnel_user, "tunnel-user")?;
        Ok(Some(TunnelConfig::new(host.as_str(), self.tunnel_port, user, auth)))
    }

    /// Get the connection timeout as a Duration.
    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

fn required(value: &Option<String>, field: &str) -> DialectResult<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .ok_or_else(|| {
            DialectError::configuration(
                field,
                format!("is required (--{} or its REDSHIFT_* variable)", field),
            )
        })
}
