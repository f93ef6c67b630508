//! SQL dialect capability sets.
//!
//! A query engine talks to every backend through [`SqlDialect`]. The trait
//! methods carry generic PostgreSQL-family defaults, so a concrete dialect
//! implements the three identity methods and overrides only what differs.
//! [`Redshift`] is the Redshift implementation.

pub mod datetime;
pub mod redshift;

pub use datetime::{
    CalendarUnit, DateTimeExpression, EpochUnit, parse_db_time, relative_date, unix_timestamp,
    unix_timestamp_expr,
};
pub use redshift::{DialectDescriptor, Redshift};

use crate::db::schema::{CatalogConnection, CatalogIntrospector};
use crate::db::types::{CanonicalType, TypeMapper};
use crate::models::{ConnectionConfig, ConnectionDescriptor, ConnectionField};
use datetime::sql_number;

/// Capability set of a SQL dialect.
pub trait SqlDialect: Send + Sync {
    /// Stable dialect identifier, e.g. `redshift`.
    fn name(&self) -> &'static str;

    /// Ordered connection form fields.
    fn connection_fields(&self) -> &'static [ConnectionField];

    /// Build the native connection descriptor for a configuration.
    fn connection_descriptor(&self, config: &ConnectionConfig) -> ConnectionDescriptor;

    fn type_mapper(&self) -> TypeMapper {
        TypeMapper::postgres()
    }

    fn map_type(&self, native_type: &str) -> CanonicalType {
        self.type_mapper().map(native_type)
    }

    /// SQL for the current timestamp.
    fn now_sql(&self) -> &'static str {
        "now()"
    }

    /// Query returning the database's current time as text.
    fn current_time_query(&self) -> &'static str {
        datetime::CURRENT_TIME_QUERY
    }

    /// chrono format string matching [`current_time_query`](Self::current_time_query).
    fn current_time_format(&self) -> &'static str {
        datetime::CURRENT_TIME_FORMAT
    }

    /// Session time zone statement with a single `%s` placeholder.
    fn set_timezone_template(&self) -> &'static str {
        "SET SESSION TIMEZONE TO %s;"
    }

    fn set_timezone_sql(&self, time_zone: &str) -> String {
        self.set_timezone_template()
            .replacen("%s", &quote_literal(time_zone), 1)
    }

    fn unix_timestamp(&self, value: f64, unit: EpochUnit) -> DateTimeExpression {
        let seconds = value / f64::from(unit.per_second());
        if seconds.is_finite() {
            DateTimeExpression::new(format!("to_timestamp({})", sql_number(seconds)))
        } else {
            DateTimeExpression::new("CAST(NULL AS TIMESTAMP)")
        }
    }

    fn relative_date(&self, unit: CalendarUnit, amount: i64) -> DateTimeExpression {
        datetime::now_plus_interval(self.now_sql(), unit, amount)
    }

    /// Catalog introspector over `conn`, using this dialect's type mapper.
    fn introspector<'a, C>(&self, conn: &'a C) -> CatalogIntrospector<'a, C>
    where
        Self: Sized,
        C: CatalogConnection + ?Sized,
    {
        CatalogIntrospector::with_mapper(conn, self.type_mapper())
    }
}

/// Quote a string as a SQL literal, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
