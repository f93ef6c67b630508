//! Schema-related data models.
//!
//! Value objects produced by catalog introspection. They are created fresh
//! per call and owned by the caller.

use crate::db::types::CanonicalType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A table identified by schema and name.
///
/// Ordering is (schema, name) so sets of tables list schema by schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    /// Create a new table reference.
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Parse `schema.table`, defaulting the schema to `public`.
    pub fn parse(qualified: &str) -> Self {
        match qualified.split_once('.') {
            Some((schema, name)) => Self::new(schema, name),
            None => Self::new("public", qualified),
        }
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// A foreign-key reference from one column of a source table to a column of
/// a destination table, backed by a database-level constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ForeignKeyEdge {
    pub source_column: String,
    pub destination_table: TableRef,
    pub destination_column: String,
}

impl ForeignKeyEdge {
    pub fn new(
        source_column: impl Into<String>,
        destination_table: TableRef,
        destination_column: impl Into<String>,
    ) -> Self {
        Self {
            source_column: source_column.into(),
            destination_table,
            destination_column: destination_column.into(),
        }
    }
}

/// A table together with its outgoing foreign keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableForeignKeys {
    #[serde(flatten)]
    pub table: TableRef,
    pub foreign_keys: BTreeSet<ForeignKeyEdge>,
}

/// A column of a table with its native and canonical types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDefinition {
    pub name: String,
    pub native_type: String,
    pub canonical_type: CanonicalType,
    /// 1-based ordinal position
    pub position: u32,
    pub nullable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_ref_parse() {
        assert_eq!(TableRef::parse("sales.orders"), TableRef::new("sales", "orders"));
        assert_eq!(TableRef::parse("orders"), TableRef::new("public", "orders"));
    }

    #[test]
    fn test_table_ref_display() {
        assert_eq!(TableRef::new("public", "orders").to_string(), "public.orders");
    }

    #[test]
    fn test_table_ref_orders_by_schema_first() {
        let mut tables = vec![
            TableRef::new("sales", "a"),
            TableRef::new("public", "z"),
            TableRef::new("public", "b"),
        ];
        tables.sort();
        assert_eq!(
            tables,
            vec![
                TableRef::new("public", "b"),
                TableRef::new("public", "z"),
                TableRef::new("sales", "a"),
            ]
        );
    }

    #[test]
    fn test_edge_serializes_destination_table() {
        let edge = ForeignKeyEdge::new("customer_id", TableRef::new("public", "customers"), "id");
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["destination_table"]["name"], "customers");
        assert_eq!(json["destination_column"], "id");
    }
}
