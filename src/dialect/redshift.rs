//! The Redshift dialect.

use super::SqlDialect;
use super::datetime::{self, CalendarUnit, DateTimeExpression, EpochUnit};
use crate::db::connection::ConnectionSpecBuilder;
use crate::db::types::TypeMapper;
use crate::models::{
    ConnectionConfig, ConnectionDescriptor, ConnectionField, FieldType,
};
use serde::Serialize;

pub const DIALECT_NAME: &str = "redshift";

pub const SET_TIMEZONE_TEMPLATE: &str = "SET TIMEZONE TO %s;";

static CONNECTION_FIELDS: [ConnectionField; 12] = [
    ConnectionField::new("host", "Host", FieldType::String, true)
        .with_placeholder("my-cluster-name.abcd1234.us-east-1.redshift.amazonaws.com"),
    ConnectionField::new("port", "Port", FieldType::Integer, true).with_default("5439"),
    ConnectionField::new("db", "Database name", FieldType::String, true)
        .with_placeholder("birds_of_the_world"),
    ConnectionField::new("user", "Username", FieldType::String, true),
    ConnectionField::new("password", "Password", FieldType::Password, false),
    ConnectionField::new(
        "additional-options",
        "Additional JDBC connection string options",
        FieldType::String,
        false,
    )
    .with_placeholder("SocketTimeout=0"),
    ConnectionField::new("tunnel-enabled", "Use an SSH tunnel", FieldType::Boolean, false)
        .with_default("false"),
    ConnectionField::new("tunnel-host", "SSH tunnel host", FieldType::String, false),
    ConnectionField::new("tunnel-port", "SSH tunnel port", FieldType::Integer, false)
        .with_default("22"),
    ConnectionField::new("tunnel-user", "SSH tunnel username", FieldType::String, false),
    ConnectionField::new("tunnel-pass", "SSH tunnel password", FieldType::Password, false),
    ConnectionField::new(
        "tunnel-private-key",
        "SSH private key",
        FieldType::Secret,
        false,
    ),
];

/// Amazon Redshift: PostgreSQL-family defaults with Redshift's types, epoch
/// arithmetic, `GETDATE()` and mandatory TLS.
#[derive(Debug, Clone, Copy, Default)]
pub struct Redshift;

impl Redshift {
    /// Serializable summary of the dialect's static capabilities.
    pub fn describe(&self) -> DialectDescriptor {
        DialectDescriptor {
            name: self.name(),
            connection_fields: self.connection_fields(),
            current_time_query: self.current_time_query(),
            current_time_format: self.current_time_format(),
            set_timezone_template: self.set_timezone_template(),
        }
    }
}

impl SqlDialect for Redshift {
    fn name(&self) -> &'static str {
        DIALECT_NAME
    }

    fn connection_fields(&self) -> &'static [ConnectionField] {
        &CONNECTION_FIELDS
    }

    fn connection_descriptor(&self, config: &ConnectionConfig) -> ConnectionDescriptor {
        ConnectionSpecBuilder::build(config)
    }

    fn type_mapper(&self) -> TypeMapper {
        TypeMapper::redshift()
    }

    fn now_sql(&self) -> &'static str {
        datetime::REDSHIFT_NOW
    }

    fn set_timezone_template(&self) -> &'static str {
        SET_TIMEZONE_TEMPLATE
    }

    fn unix_timestamp(&self, value: f64, unit: EpochUnit) -> DateTimeExpression {
        datetime::unix_timestamp(value, unit)
    }

    fn relative_date(&self, unit: CalendarUnit, amount: i64) -> DateTimeExpression {
        datetime::relative_date(unit, amount)
    }
}

/// Static capabilities of a dialect, as handed to a UI or host engine.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DialectDescriptor {
    pub name: &'static str,
    pub connection_fields: &'static [ConnectionField],
    pub current_time_query: &'static str,
    pub current_time_format: &'static str,
    pub set_timezone_template: &'static str,
}
