//! Native column type → canonical type mapping.
//!
//! # Architecture
//!
//! Mapping is a closed, data-only lookup:
//! 1. [`normalize_type_name`] lowercases the native spelling, drops numeric
//!    qualifiers such as `(255)` or `(10,2)` and collapses whitespace
//! 2. The normalized name is looked up in a process-wide table; anything
//!    absent resolves to [`CanonicalType::Opaque`]
//!
//! Tables are layered: dialect-specific entries are consulted before the
//! PostgreSQL-family base table, so a dialect only lists what differs.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;

// =============================================================================
// Canonical Types
// =============================================================================

/// Product-agnostic column type vocabulary used by the host engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CanonicalType {
    #[serde(rename = "type/Integer")]
    Integer,
    #[serde(rename = "type/BigInteger")]
    BigInteger,
    #[serde(rename = "type/Float")]
    Float,
    #[serde(rename = "type/Decimal")]
    Decimal,
    #[serde(rename = "type/Boolean")]
    Boolean,
    #[serde(rename = "type/Text")]
    Text,
    #[serde(rename = "type/Date")]
    Date,
    #[serde(rename = "type/Time")]
    Time,
    #[serde(rename = "type/DateTime")]
    DateTime,
    #[serde(rename = "type/UUID")]
    Uuid,
    #[serde(rename = "type/IPAddress")]
    IpAddress,
    /// Structurally unrecognized; treat as an inert blob.
    #[serde(rename = "type/*")]
    Opaque,
}

impl CanonicalType {
    /// Canonical tag as understood by the host engine.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "type/Integer",
            Self::BigInteger => "type/BigInteger",
            Self::Float => "type/Float",
            Self::Decimal => "type/Decimal",
            Self::Boolean => "type/Boolean",
            Self::Text => "type/Text",
            Self::Date => "type/Date",
            Self::Time => "type/Time",
            Self::DateTime => "type/DateTime",
            Self::Uuid => "type/UUID",
            Self::IpAddress => "type/IPAddress",
            Self::Opaque => "type/*",
        }
    }

    /// True for the "no further structural assumptions" fallback.
    pub fn is_opaque(&self) -> bool {
        matches!(self, Self::Opaque)
    }

    /// True for date, time and timestamp types.
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Time | Self::DateTime)
    }
}

impl std::fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Lookup Tables
// =============================================================================

type TypeTable = HashMap<&'static str, CanonicalType>;

/// PostgreSQL-family types shared by every dialect built on the relational base.
static POSTGRES_BASE_TYPES: LazyLock<TypeTable> = LazyLock::new(|| {
    use CanonicalType::*;
    HashMap::from([
        // Integer family
        ("smallint", Integer),
        ("int2", Integer),
        ("integer", Integer),
        ("int", Integer),
        ("int4", Integer),
        ("smallserial", Integer),
        ("serial", Integer),
        ("serial2", Integer),
        ("serial4", Integer),
        ("bigint", BigInteger),
        ("int8", BigInteger),
        ("bigserial", BigInteger),
        ("serial8", BigInteger),
        // Floating and fixed point
        ("real", Float),
        ("float4", Float),
        ("float", Float),
        ("float8", Float),
        ("double precision", Float),
        ("numeric", Decimal),
        ("decimal", Decimal),
        ("money", Decimal),
        // Boolean
        ("bool", Boolean),
        ("boolean", Boolean),
        // Text family
        ("char", Text),
        ("character", Text),
        ("bpchar", Text),
        ("varchar", Text),
        ("character varying", Text),
        ("text", Text),
        ("citext", Text),
        ("name", Text),
        ("json", Text),
        ("jsonb", Text),
        ("xml", Text),
        // Temporal
        ("date", Date),
        ("time", Time),
        ("timetz", Time),
        ("time without time zone", Time),
        ("time with time zone", Time),
        ("timestamp", DateTime),
        ("timestamptz", DateTime),
        ("timestamp without time zone", DateTime),
        ("timestamp with time zone", DateTime),
        // Identifiers and network
        ("uuid", Uuid),
        ("inet", IpAddress),
        ("cidr", Text),
        ("macaddr", Text),
        ("macaddr8", Text),
        // Geometric
        ("point", Opaque),
        ("line", Opaque),
        ("lseg", Opaque),
        ("box", Opaque),
        ("path", Opaque),
        ("polygon", Opaque),
        ("circle", Opaque),
        ("geometry", Opaque),
        // Binary and bit strings
        ("bytea", Opaque),
        ("bit", Opaque),
        ("bit varying", Opaque),
        ("varbit", Opaque),
        // Interval, full-text search, transaction snapshots
        ("interval", Opaque),
        ("tsvector", Opaque),
        ("tsquery", Opaque),
        ("txid_snapshot", Opaque),
        ("pg_lsn", Opaque),
    ])
});

/// Spellings and types specific to Redshift.
static REDSHIFT_TYPES: LazyLock<TypeTable> = LazyLock::new(|| {
    use CanonicalType::*;
    HashMap::from([
        ("nchar", Text),
        ("nvarchar", Text),
        ("national character", Text),
        ("national character varying", Text),
        // Redshift reports these without the space in "time zone"
        ("timestamp with timezone", DateTime),
        ("timestamp without timezone", DateTime),
        ("time with timezone", Time),
        ("time without timezone", Time),
        ("super", Opaque),
        ("varbyte", Opaque),
        ("varbinary", Opaque),
        ("binary varying", Opaque),
        ("hllsketch", Opaque),
        ("geography", Opaque),
    ])
});

// =============================================================================
// Type Mapper
// =============================================================================

/// Maps native type names onto [`CanonicalType`]. Total and pure.
#[derive(Debug, Clone, Copy)]
pub struct TypeMapper {
    dialect: Option<&'static TypeTable>,
    base: &'static TypeTable,
}

impl TypeMapper {
    /// Mapper for the generic PostgreSQL-family base.
    pub fn postgres() -> Self {
        Self {
            dialect: None,
            base: &POSTGRES_BASE_TYPES,
        }
    }

    /// Mapper for Redshift: Redshift entries first, then the base table.
    pub fn redshift() -> Self {
        Self {
            dialect: Some(&REDSHIFT_TYPES),
            base: &POSTGRES_BASE_TYPES,
        }
    }

    /// Map a native type name. Unknown names resolve to `Opaque`.
    pub fn map(&self, native_type: &str) -> CanonicalType {
        let normalized = normalize_type_name(native_type);
        self.dialect
            .and_then(|table| table.get(normalized.as_str()))
            .or_else(|| self.base.get(normalized.as_str()))
            .copied()
            .unwrap_or(CanonicalType::Opaque)
    }

    /// True if the name resolves through a table entry rather than the fallback.
    pub fn is_known(&self, native_type: &str) -> bool {
        let normalized = normalize_type_name(native_type);
        self.dialect
            .is_some_and(|table| table.contains_key(normalized.as_str()))
            || self.base.contains_key(normalized.as_str())
    }
}

/// Map a native Redshift type name to its canonical type.
pub fn map_native_type(native_type: &str) -> CanonicalType {
    TypeMapper::redshift().map(native_type)
}

/// Normalize a native type spelling for lookup.
///
/// Lowercases, removes double quotes and a `pg_catalog.` prefix, drops every
/// parenthesized numeric (or `max`) qualifier and collapses whitespace, so
/// `"Character Varying(255)"` and `character varying` are the same key.
pub fn normalize_type_name(native_type: &str) -> String {
    let lower = native_type.to_lowercase().replace('"', "");
    let lower = lower.trim();
    let lower = lower.strip_prefix("pg_catalog.").unwrap_or(lower);

    let mut stripped = String::with_capacity(lower.len());
    let mut rest = lower;
    while let Some(open) = rest.find('(') {
        stripped.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        match after_open.find(')') {
            Some(close) if is_type_qualifier(&after_open[..close]) => {
                stripped.push(' ');
                rest = &after_open[close + 1..];
            }
            _ => {
                stripped.push('(');
                rest = after_open;
            }
        }
    }
    stripped.push_str(rest);

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `255`, `10,2`, ` 10 , 2 ` or `max`.
fn is_type_qualifier(inner: &str) -> bool {
    let inner = inner.trim();
    if inner == "max" {
        return true;
    }
    inner.chars().any(|c| c.is_ascii_digit())
        && inner
            .chars()
            .all(|c| c.is_ascii_digit() || c == ',' || c.is_whitespace())
}
