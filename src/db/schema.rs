//! Catalog introspection module.
//!
//! Discovers tables, columns and foreign-key topology by querying Redshift's
//! system catalogs directly. The driver-level "imported keys" call is
//! unreliable on Redshift and `information_schema.constraint_column_usage`
//! is not readable under its permission model, so foreign keys are rebuilt
//! from `pg_constraint` and friends.
//!
//! # Architecture
//!
//! SQL lives in the `queries` submodule and is never assembled by callers.
//! Queries run through a [`CatalogConnection`], the seam to the external
//! connection provider; [`sqlx::PgPool`] implements it. Every call issues a
//! fresh query and nothing is cached between calls.

use crate::db::row::{CatalogRow, get_bool, get_i64, get_str, pg_row_to_catalog_row};
use crate::db::types::TypeMapper;
use crate::error::{DialectError, DialectResult};
use crate::models::{FieldDefinition, ForeignKeyEdge, TableForeignKeys, TableRef};
use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt, stream};
use sqlx::PgPool;
use std::collections::BTreeSet;
use tracing::debug;

/// Schemas that never hold user tables.
pub const EXCLUDED_SCHEMAS: &[&str] = &["pg_catalog", "information_schema", "pg_internal"];

/// True if tables in `schema` are excluded from discovery.
pub fn is_excluded_schema(schema: &str) -> bool {
    EXCLUDED_SCHEMAS.contains(&schema)
}

/// An open connection able to run parameterized read queries.
///
/// Implementations must surface every failure; this layer never retries.
#[async_trait]
pub trait CatalogConnection: Send + Sync {
    /// Run `sql` with positional text parameters (`$1`, `$2`, ...).
    async fn fetch_rows(&self, sql: &str, params: &[&str]) -> DialectResult<Vec<CatalogRow>>;
}

#[async_trait]
impl CatalogConnection for PgPool {
    async fn fetch_rows(&self, sql: &str, params: &[&str]) -> DialectResult<Vec<CatalogRow>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(*param);
        }
        let rows = query.fetch_all(self).await?;
        rows.iter().map(pg_row_to_catalog_row).collect()
    }
}

#[async_trait]
impl<T: CatalogConnection + ?Sized> CatalogConnection for std::sync::Arc<T> {
    async fn fetch_rows(&self, sql: &str, params: &[&str]) -> DialectResult<Vec<CatalogRow>> {
        (**self).fetch_rows(sql, params).await
    }
}

// =============================================================================
// SQL Query Templates
// =============================================================================

mod queries {
    pub const LIST_TABLES: &str = r#"
        SELECT DISTINCT
            table_schema::text AS table_schema,
            table_name::text AS table_name
        FROM information_schema.columns
        WHERE table_schema NOT IN ('pg_catalog', 'information_schema', 'pg_internal')
        ORDER BY table_schema, table_name
        "#;

    // conkey/confkey are paired by array position so a composite key yields
    // one row per column pair. 32 is the server's maximum key width.
    pub const DESCRIBE_FOREIGN_KEYS: &str = r#"
        SELECT
            source_column.attname::text AS source_column,
            dest_table.relname::text AS dest_table,
            dest_ns.nspname::text AS dest_schema,
            dest_column.attname::text AS dest_column
        FROM pg_catalog.pg_constraint c
        JOIN pg_catalog.pg_namespace n ON n.oid = c.connamespace
        JOIN pg_catalog.pg_class source_table ON source_table.oid = c.conrelid
        JOIN pg_catalog.pg_attribute source_column ON source_column.attrelid = c.conrelid
        JOIN pg_catalog.pg_class dest_table ON dest_table.oid = c.confrelid
        JOIN pg_catalog.pg_namespace dest_ns ON dest_ns.oid = dest_table.relnamespace
        JOIN pg_catalog.pg_attribute dest_column ON dest_column.attrelid = c.confrelid
        JOIN generate_series(1, 32) AS key_pos(i) ON key_pos.i <= array_upper(c.conkey, 1)
        WHERE c.contype = 'f'
        AND source_table.relname = $1
        AND n.nspname = $2
        AND source_column.attnum = c.conkey[key_pos.i]
        AND dest_column.attnum = c.confkey[key_pos.i]
        ORDER BY c.conname, key_pos.i
        "#;

    pub const DESCRIBE_FIELDS: &str = r#"
        SELECT
            a.attname::text AS column_name,
            format_type(a.atttypid, a.atttypmod)::text AS column_type,
            a.attnum::int4 AS ordinal_position,
            NOT a.attnotnull AS is_nullable
        FROM pg_catalog.pg_attribute a
        JOIN pg_catalog.pg_class t ON t.oid = a.attrelid
        JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
        WHERE t.relname = $1
        AND n.nspname = $2
        AND a.attnum > 0
        AND NOT a.attisdropped
        ORDER BY a.attnum
        "#;
}

pub use queries::{DESCRIBE_FIELDS, DESCRIBE_FOREIGN_KEYS, LIST_TABLES};

// =============================================================================
// Introspector
// =============================================================================

/// Read-only catalog discovery over a caller-supplied connection.
pub struct CatalogIntrospector<'a, C: CatalogConnection + ?Sized> {
    conn: &'a C,
    mapper: TypeMapper,
}

impl<'a, C: CatalogConnection + ?Sized> CatalogIntrospector<'a, C> {
    /// Create an introspector using the Redshift type mapper.
    pub fn new(conn: &'a C) -> Self {
        Self::with_mapper(conn, TypeMapper::redshift())
    }

    pub fn with_mapper(conn: &'a C, mapper: TypeMapper) -> Self {
        Self { conn, mapper }
    }

    /// List every user table, one entry per (schema, name).
    ///
    /// An empty database yields an empty set, not an error.
    pub async fn list_tables(&self) -> DialectResult<BTreeSet<TableRef>> {
        const OPERATION: &str = "list tables";
        let rows = self
            .conn
            .fetch_rows(LIST_TABLES, &[])
            .await
            .map_err(|e| e.context(OPERATION))?;

        let mut tables = BTreeSet::new();
        for row in &rows {
            let schema = required(row, "table_schema", OPERATION)?;
            let name = required(row, "table_name", OPERATION)?;
            if is_excluded_schema(schema) {
                continue;
            }
            tables.insert(TableRef::new(schema, name));
        }

        debug!(count = tables.len(), "Listed Redshift tables");
        Ok(tables)
    }

    /// Reconstruct the outgoing foreign-key edges of `table`.
    ///
    /// Destination tables are reported whatever their schema, including
    /// schemas that [`list_tables`](Self::list_tables) excludes.
    pub async fn list_foreign_keys(
        &self,
        table: &TableRef,
    ) -> DialectResult<BTreeSet<ForeignKeyEdge>> {
        const OPERATION: &str = "list foreign keys";
        let rows = self
            .conn
            .fetch_rows(DESCRIBE_FOREIGN_KEYS, &[table.name.as_str(), table.schema.as_str()])
            .await
            .map_err(|e| e.context(OPERATION))?;

        let mut edges = BTreeSet::new();
        for row in &rows {
            let destination = TableRef::new(
                required(row, "dest_schema", OPERATION)?,
                required(row, "dest_table", OPERATION)?,
            );
            edges.insert(ForeignKeyEdge::new(
                required(row, "source_column", OPERATION)?,
                destination,
                required(row, "dest_column", OPERATION)?,
            ));
        }

        debug!(
            count = edges.len(),
            table = %table,
            "Listed Redshift foreign keys"
        );
        Ok(edges)
    }

    /// Describe the columns of `table` in ordinal order, with canonical types.
    pub async fn describe_fields(&self, table: &TableRef) -> DialectResult<Vec<FieldDefinition>> {
        const OPERATION: &str = "describe fields";
        let rows = self
            .conn
            .fetch_rows(DESCRIBE_FIELDS, &[table.name.as_str(), table.schema.as_str()])
            .await
            .map_err(|e| e.context(OPERATION))?;

        let mut fields = Vec::with_capacity(rows.len());
        for row in &rows {
            let native_type = required(row, "column_type", OPERATION)?;
            let position = get_i64(row, "ordinal_position")
                .and_then(|p| u32::try_from(p).ok())
                .ok_or_else(|| malformed_row(OPERATION, "ordinal_position"))?;
            fields.push(FieldDefinition {
                name: required(row, "column_name", OPERATION)?.to_string(),
                native_type: native_type.to_string(),
                canonical_type: self.mapper.map(native_type),
                position,
                nullable: get_bool(row, "is_nullable")
                    .ok_or_else(|| malformed_row(OPERATION, "is_nullable"))?,
            });
        }
        fields.sort_by_key(|f| f.position);

        debug!(
            count = fields.len(),
            table = %table,
            "Described Redshift fields"
        );
        Ok(fields)
    }

    /// Foreign keys of every listed table, queried at most `concurrency` at a
    /// time. The first failure aborts the whole graph.
    pub async fn foreign_key_graph(&self, concurrency: usize) -> DialectResult<Vec<TableForeignKeys>> {
        let tables = self.list_tables().await?;
        let mut graph: Vec<TableForeignKeys> = stream::iter(tables)
            .map(|table| async move {
                let foreign_keys = self.list_foreign_keys(&table).await?;
                Ok::<_, DialectError>(TableForeignKeys { table, foreign_keys })
            })
            .buffer_unordered(concurrency.max(1))
            .try_collect()
            .await?;
        graph.sort_by(|a, b| a.table.cmp(&b.table));

        debug!(tables = graph.len(), "Built Redshift foreign-key graph");
        Ok(graph)
    }
}

fn required<'r>(row: &'r CatalogRow, column: &str, operation: &str) -> DialectResult<&'r str> {
    get_str(row, column).ok_or_else(|| malformed_row(operation, column))
}

fn malformed_row(operation: &str, column: &str) -> DialectError {
    DialectError::catalog_access(
        operation,
        format!("catalog column '{}' is missing or mistyped", column),
        None,
        "The catalog layout differs from the expected Redshift layout",
    )
}
