//! Database layer.
//!
//! - Connection descriptor construction
//! - Catalog row decoding
//! - Catalog introspection
//! - Native type mapping

pub mod connection;
pub mod row;
pub mod schema;
pub mod types;

pub use connection::{ConnectionSpecBuilder, REDSHIFT_DRIVER, REDSHIFT_SUBPROTOCOL};
pub use row::{CatalogRow, pg_row_to_catalog_row};
pub use schema::{CatalogConnection, CatalogIntrospector, EXCLUDED_SCHEMAS, is_excluded_schema};
pub use types::{CanonicalType, TypeMapper, map_native_type, normalize_type_name};
