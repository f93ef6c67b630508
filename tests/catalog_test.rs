//! Catalog introspection tests against an in-memory catalog.
//!
//! `InMemoryCatalog` answers the introspector's three catalog queries the way
//! the system catalogs would: one row per registered column for the table
//! listing, and one row per positional (conkey, confkey) pair for foreign keys.

use async_trait::async_trait;
use redshift_dialect::db::schema::{DESCRIBE_FIELDS, DESCRIBE_FOREIGN_KEYS, LIST_TABLES};
use redshift_dialect::db::{CanonicalType, CatalogConnection, CatalogIntrospector, CatalogRow};
use redshift_dialect::error::{DialectError, DialectResult};
use redshift_dialect::models::{ForeignKeyEdge, TableRef};
use redshift_dialect::{Redshift, SqlDialect};
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct Relation {
    schema: &'static str,
    name: &'static str,
    /// (attnum, name, type, nullable)
    columns: Vec<(i32, &'static str, &'static str, bool)>,
}

struct Constraint {
    schema: &'static str,
    table: &'static str,
    conkey: Vec<i32>,
    foreign_schema: &'static str,
    foreign_table: &'static str,
    confkey: Vec<i32>,
}

#[derive(Default)]
struct InMemoryCatalog {
    relations: Vec<Relation>,
    constraints: Vec<Constraint>,
    queries: AtomicUsize,
}

impl InMemoryCatalog {
    fn relation(
        mut self,
        schema: &'static str,
        name: &'static str,
        columns: &[(&'static str, &'static str)],
    ) -> Self {
        let columns = columns
            .iter()
            .enumerate()
            .map(|(i, (col, ty))| (i as i32 + 1, *col, *ty, true))
            .collect();
        self.relations.push(Relation { schema, name, columns });
        self
    }

    fn foreign_key(
        mut self,
        (schema, table): (&'static str, &'static str),
        conkey: &[i32],
        (foreign_schema, foreign_table): (&'static str, &'static str),
        confkey: &[i32],
    ) -> Self {
        self.constraints.push(Constraint {
            schema,
            table,
            conkey: conkey.to_vec(),
            foreign_schema,
            foreign_table,
            confkey: confkey.to_vec(),
        });
        self
    }

    fn find(&self, schema: &str, name: &str) -> Option<&Relation> {
        self.relations
            .iter()
            .find(|r| r.schema == schema && r.name == name)
    }

    fn attname(&self, schema: &str, table: &str, attnum: i32) -> Option<&'static str> {
        self.find(schema, table)?
            .columns
            .iter()
            .find(|(n, ..)| *n == attnum)
            .map(|(_, name, ..)| *name)
    }

    fn foreign_key_rows(&self, table: &str, schema: &str) -> Vec<CatalogRow> {
        let mut rows = Vec::new();
        for c in self
            .constraints
            .iter()
            .filter(|c| c.table == table && c.schema == schema)
        {
            for (src, dst) in c.conkey.iter().zip(&c.confkey) {
                let (Some(source), Some(dest)) = (
                    self.attname(c.schema, c.table, *src),
                    self.attname(c.foreign_schema, c.foreign_table, *dst),
                ) else {
                    continue;
                };
                rows.push(row(json!({
                    "source_column": source,
                    "dest_table": c.foreign_table,
                    "dest_schema": c.foreign_schema,
                    "dest_column": dest,
                })));
            }
        }
        rows
    }
}

#[async_trait]
impl CatalogConnection for InMemoryCatalog {
    async fn fetch_rows(&self, sql: &str, params: &[&str]) -> DialectResult<Vec<CatalogRow>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if sql == LIST_TABLES {
            Ok(self
                .relations
                .iter()
                .flat_map(|r| {
                    r.columns.iter().map(move |_| {
                        row(json!({"table_schema": r.schema, "table_name": r.name}))
                    })
                })
                .collect())
        } else if sql == DESCRIBE_FOREIGN_KEYS {
            Ok(self.foreign_key_rows(params[0], params[1]))
        } else if sql == DESCRIBE_FIELDS {
            Ok(self
                .find(params[1], params[0])
                .map(|r| {
                    r.columns
                        .iter()
                        .rev()
                        .map(|(num, name, ty, nullable)| {
                            row(json!({
                                "column_name": name,
                                "column_type": ty,
                                "ordinal_position": num,
                                "is_nullable": nullable,
                            }))
                        })
                        .collect()
                })
                .unwrap_or_default())
        } else {
            Err(DialectError::catalog_access(
                "catalog query",
                "unexpected statement",
                None,
                "",
            ))
        }
    }
}

/// Fails every query, as a dropped connection would.
struct BrokenConnection;

#[async_trait]
impl CatalogConnection for BrokenConnection {
    async fn fetch_rows(&self, _sql: &str, _params: &[&str]) -> DialectResult<Vec<CatalogRow>> {
        Err(DialectError::from(sqlx::Error::PoolClosed))
    }
}

fn row(value: Value) -> CatalogRow {
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn shop() -> InMemoryCatalog {
    InMemoryCatalog::default()
        .relation(
            "public",
            "orders",
            &[
                ("id", "integer"),
                ("customer_id", "integer"),
                ("customer_region", "varchar(16)"),
            ],
        )
        .relation(
            "public",
            "customers",
            &[("id", "integer"), ("region", "character varying(16)")],
        )
        .relation("pg_catalog", "internal_stuff", &[("oid", "oid")])
        .foreign_key(("public", "orders"), &[2, 3], ("public", "customers"), &[1, 2])
}

#[tokio::test]
async fn test_list_tables_excludes_system_schemas() {
    let catalog = shop();
    let tables = CatalogIntrospector::new(&catalog).list_tables().await.unwrap();
    let expected: BTreeSet<_> = [
        TableRef::new("public", "orders"),
        TableRef::new("public", "customers"),
    ]
    .into_iter()
    .collect();
    assert_eq!(tables, expected);
}

#[tokio::test]
async fn test_list_tables_excludes_every_internal_schema() {
    let catalog = InMemoryCatalog::default()
        .relation("information_schema", "columns", &[("x", "text")])
        .relation("pg_internal", "redshift_auto_health_check", &[("a", "integer")])
        .relation("analytics", "events", &[("a", "integer")]);
    let tables = CatalogIntrospector::new(&catalog).list_tables().await.unwrap();
    assert_eq!(tables.len(), 1);
    assert!(tables.contains(&TableRef::new("analytics", "events")));
}

#[tokio::test]
async fn test_list_tables_empty_database() {
    let catalog = InMemoryCatalog::default();
    let tables = CatalogIntrospector::new(&catalog).list_tables().await.unwrap();
    assert!(tables.is_empty());
}

#[tokio::test]
async fn test_composite_foreign_key_yields_edge_per_column() {
    let catalog = shop();
    let edges = CatalogIntrospector::new(&catalog)
        .list_foreign_keys(&TableRef::new("public", "orders"))
        .await
        .unwrap();

    let customers = TableRef::new("public", "customers");
    let expected: BTreeSet<_> = [
        ForeignKeyEdge::new("customer_id", customers.clone(), "id"),
        ForeignKeyEdge::new("customer_region", customers.clone(), "region"),
    ]
    .into_iter()
    .collect();
    assert_eq!(edges, expected);
    assert!(edges.iter().all(|e| e.destination_table == customers));
}

#[tokio::test]
async fn test_no_outgoing_foreign_keys() {
    let catalog = shop();
    let edges = CatalogIntrospector::new(&catalog)
        .list_foreign_keys(&TableRef::new("public", "customers"))
        .await
        .unwrap();
    assert!(edges.is_empty());
}

#[tokio::test]
async fn test_same_name_in_other_schema_is_not_matched() {
    let catalog = shop().relation("staging", "orders", &[("id", "integer")]);
    let edges = CatalogIntrospector::new(&catalog)
        .list_foreign_keys(&TableRef::new("staging", "orders"))
        .await
        .unwrap();
    assert!(edges.is_empty());
}

#[tokio::test]
async fn test_destination_in_excluded_schema_is_reported() {
    let catalog = InMemoryCatalog::default()
        .relation("public", "audit", &[("id", "integer"), ("owner", "oid")])
        .relation("pg_catalog", "pg_authid", &[("oid", "oid")])
        .foreign_key(("public", "audit"), &[2], ("pg_catalog", "pg_authid"), &[1]);
    let edges = CatalogIntrospector::new(&catalog)
        .list_foreign_keys(&TableRef::new("public", "audit"))
        .await
        .unwrap();
    assert_eq!(edges.len(), 1);
    let edge = edges.iter().next().unwrap();
    assert_eq!(edge.destination_table, TableRef::new("pg_catalog", "pg_authid"));
    assert_eq!(edge.destination_column, "oid");
}

#[tokio::test]
async fn test_describe_fields_applies_type_mapper() {
    let catalog = shop();
    let fields = Redshift
        .introspector(&catalog)
        .describe_fields(&TableRef::new("public", "orders"))
        .await
        .unwrap();
    let summary: Vec<_> = fields
        .iter()
        .map(|f| (f.position, f.name.as_str(), f.canonical_type))
        .collect();
    assert_eq!(
        summary,
        vec![
            (1, "id", CanonicalType::Integer),
            (2, "customer_id", CanonicalType::Integer),
            (3, "customer_region", CanonicalType::Text),
        ]
    );
}

#[tokio::test]
async fn test_foreign_key_graph_covers_every_table() {
    let catalog = shop();
    let graph = CatalogIntrospector::new(&catalog)
        .foreign_key_graph(2)
        .await
        .unwrap();
    let tables: Vec<_> = graph.iter().map(|t| t.table.to_string()).collect();
    assert_eq!(tables, ["public.customers", "public.orders"]);
    assert!(graph[0].foreign_keys.is_empty());
    assert_eq!(graph[1].foreign_keys.len(), 2);
}

#[tokio::test]
async fn test_every_call_queries_the_catalog() {
    let catalog = Arc::new(shop());
    let introspector = CatalogIntrospector::new(&catalog);
    introspector.list_tables().await.unwrap();
    introspector.list_tables().await.unwrap();
    introspector
        .list_foreign_keys(&TableRef::new("public", "orders"))
        .await
        .unwrap();
    assert_eq!(catalog.queries.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_failures_propagate_as_catalog_access() {
    let conn = BrokenConnection;
    let introspector = CatalogIntrospector::new(&conn);

    let err = introspector.list_tables().await.unwrap_err();
    assert!(matches!(
        err,
        DialectError::CatalogAccess { ref operation, .. } if operation == "list tables"
    ));

    let err = introspector
        .list_foreign_keys(&TableRef::new("public", "orders"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DialectError::CatalogAccess { ref operation, .. } if operation == "list foreign keys"
    ));

    assert!(introspector.foreign_key_graph(4).await.is_err());
}
