//! Connection descriptor construction.
//!
//! Turns a [`ConnectionConfig`] into a [`ConnectionDescriptor`]: the native
//! driver identifier, a `//host:port/db` subname and the driver properties.
//! TLS is always required and the open-source subprotocol override (the
//! legacy, non-Redshift negotiation path) is always disabled. Building is
//! deterministic and performs no I/O.

use crate::error::DialectResult;
use crate::models::{ConnectionConfig, ConnectionDescriptor};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::collections::BTreeMap;
use std::net::Ipv6Addr;
use tracing::warn;

pub const REDSHIFT_DRIVER: &str = "com.amazon.redshift.jdbc42.Driver";
pub const REDSHIFT_SUBPROTOCOL: &str = "redshift";

/// Properties computed by the builder. Passthrough options never override them.
pub const SSL_PROPERTY: &str = "ssl";
pub const SUBPROTOCOL_OVERRIDE_PROPERTY: &str = "OpenSourceSubProtocolOverride";

/// Builds connection descriptors for Redshift.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionSpecBuilder;

impl ConnectionSpecBuilder {
    /// Build a descriptor from an already-validated configuration.
    pub fn build(config: &ConnectionConfig) -> ConnectionDescriptor {
        let mut properties = BTreeMap::new();

        if let Some(options) = &config.additional_options {
            properties.extend(parse_additional_options(options));
        }
        properties.extend(
            config
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        for (key, value) in computed_properties() {
            if let Some(previous) = properties.insert(key.to_string(), value.to_string()) {
                if previous != value {
                    warn!(
                        property = key,
                        ignored = %previous,
                        "Ignoring passthrough driver property that conflicts with a required setting"
                    );
                }
            }
        }

        ConnectionDescriptor {
            driver: REDSHIFT_DRIVER,
            subprotocol: REDSHIFT_SUBPROTOCOL,
            subname: subname(&config.host, config.port, &config.database),
            host: config.host.clone(),
            port: config.port,
            database: config.database.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
            properties,
            tunnel: config.tunnel.clone(),
        }
    }

    /// Validate the configuration, then build.
    pub fn try_build(config: &ConnectionConfig) -> DialectResult<ConnectionDescriptor> {
        config.validate()?;
        Ok(Self::build(config))
    }
}

fn computed_properties() -> [(&'static str, &'static str); 2] {
    [(SSL_PROPERTY, "true"), (SUBPROTOCOL_OVERRIDE_PROPERTY, "false")]
}

/// Encode host, port and database as `//host:port/database`.
///
/// Host and database are percent-encoded, and bare IPv6 hosts bracketed, so
/// distinct triples always give distinct subnames.
pub fn subname(host: &str, port: u16, database: &str) -> String {
    let host = if host.parse::<Ipv6Addr>().is_ok() {
        format!("[{}]", host)
    } else {
        encode_component(host)
    };
    format!("//{}:{}/{}", host, port, encode_component(database))
}

fn encode_component(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Parse `a=b&c=d` (or `;`-separated, as some driver docs spell it).
pub fn parse_additional_options(options: &str) -> BTreeMap<String, String> {
    let normalized = options.trim().trim_start_matches('?').replace(';', "&");
    url::form_urlencoded::parse(normalized.as_bytes())
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

impl ConnectionDescriptor {
    /// sqlx connect options for the Postgres wire protocol Redshift speaks.
    ///
    /// The tunnel, if any, is not applied here; the connection provider
    /// rewrites host and port after opening it.
    pub fn connect_options(&self) -> PgConnectOptions {
        let ssl_mode = if self.requires_tls() {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };
        let mut options = PgConnectOptions::new_without_pgpass()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .ssl_mode(ssl_mode);
        if !self.password.is_empty() {
            options = options.password(&self.password);
        }
        if let Some(application_name) = self.property("ApplicationName") {
            options = options.application_name(application_name);
        }
        options
    }
}
