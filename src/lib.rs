//! Redshift dialect adapter.
//!
//! Plugs Amazon Redshift into a generic query engine: connection descriptors,
//! native type mapping, catalog introspection and date/time SQL generation.

pub mod config;
pub mod db;
pub mod dialect;
pub mod error;
pub mod models;

pub use config::Config;
pub use db::{CanonicalType, CatalogConnection, CatalogIntrospector, ConnectionSpecBuilder, TypeMapper};
pub use dialect::{DialectDescriptor, Redshift, SqlDialect};
pub use error::{DialectError, DialectResult};
