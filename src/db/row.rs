//! Catalog row decoding.
//!
//! Catalog queries hand rows back as maps from column name to JSON value.
//! The decoder for each column is chosen by running the column's native type
//! name through the [`TypeMapper`], so catalog decoding and schema sync agree
//! on what a type is.

use crate::db::types::{CanonicalType, TypeMapper};
use crate::error::DialectResult;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo};

/// A catalog result row: column name → value.
pub type CatalogRow = serde_json::Map<String, JsonValue>;

/// Convert a Postgres-protocol row into a [`CatalogRow`].
///
/// Catalog queries cast their columns to `text`, `int4`, `int8` or `bool`.
/// A column that does not decode as its declared type is an error.
pub fn pg_row_to_catalog_row(row: &PgRow) -> DialectResult<CatalogRow> {
    let mapper = TypeMapper::redshift();
    row.columns()
        .iter()
        .map(|col| -> DialectResult<(String, JsonValue)> {
            let type_name = col.type_info().name();
            let value = decode_column(row, col.ordinal(), type_name, mapper.map(type_name))?;
            Ok((col.name().to_string(), value))
        })
        .collect()
}

fn decode_column(
    row: &PgRow,
    idx: usize,
    type_name: &str,
    category: CanonicalType,
) -> Result<JsonValue, sqlx::Error> {
    let value = match category {
        CanonicalType::Boolean => row.try_get::<Option<bool>, _>(idx)?.map(JsonValue::Bool),
        CanonicalType::Integer if type_name.eq_ignore_ascii_case("int2") => row
            .try_get::<Option<i16>, _>(idx)?
            .map(|v| JsonValue::Number(v.into())),
        CanonicalType::Integer => row
            .try_get::<Option<i32>, _>(idx)?
            .map(|v| JsonValue::Number(v.into())),
        CanonicalType::BigInteger => row
            .try_get::<Option<i64>, _>(idx)?
            .map(|v| JsonValue::Number(v.into())),
        _ => row.try_get::<Option<String>, _>(idx)?.map(JsonValue::String),
    };
    Ok(value.unwrap_or(JsonValue::Null))
}

// =============================================================================
// Typed Accessors
// =============================================================================

/// Read a required string column from a catalog row.
pub fn get_str<'a>(row: &'a CatalogRow, column: &str) -> Option<&'a str> {
    row.get(column).and_then(JsonValue::as_str)
}

/// Read an integer column, accepting numeric strings.
pub fn get_i64(row: &CatalogRow, column: &str) -> Option<i64> {
    match row.get(column)? {
        JsonValue::Number(n) => n.as_i64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a boolean column, accepting `YES`/`NO` as reported by
/// `information_schema`. Anything else, `NULL` included, is `None`.
pub fn get_bool(row: &CatalogRow, column: &str) -> Option<bool> {
    match row.get(column)? {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::String(s) if s.eq_ignore_ascii_case("yes") => Some(true),
        JsonValue::String(s) if s.eq_ignore_ascii_case("no") => Some(false),
        _ => None,
    }
}
