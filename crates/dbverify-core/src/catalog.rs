//! Read-only catalog access

use crate::{ColumnInfo, QueryResult, Result, TableKind, Value, VerifyError};

/// A read-only session exposing catalog metadata and bounded data queries.
///
/// Implementations never write through the handle. Drivers provide the
/// metadata listings; row counting and previews are built on `query` and
/// may be overridden when the engine has a cheaper path.
pub trait Catalog: Send + Sync {
    /// Get the driver name (e.g., "duckdb")
    fn driver_name(&self) -> &str;

    /// Execute a query that returns rows
    fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult>;

    /// Distinct schema names that hold at least one table or view, sorted
    fn list_schemas(&self) -> Result<Vec<String>>;

    /// Table and view names in `schema`, sorted by name.
    ///
    /// `kind` of `None` lists every entity regardless of kind.
    fn list_tables(&self, schema: &str, kind: Option<TableKind>) -> Result<Vec<String>>;

    /// Columns of `schema.table` ordered by physical position
    fn list_columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnInfo>>;

    /// Whether a table or view named `table` exists in `schema`
    fn table_exists(&self, schema: &str, table: &str) -> Result<bool> {
        Ok(self
            .list_tables(schema, None)?
            .iter()
            .any(|name| name == table))
    }

    /// Exact row count of `schema.table`
    fn count_rows(&self, schema: &str, table: &str) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", qualified_name(schema, table));
        let result = self.query(&sql, &[])?;
        let count = result.scalar().and_then(Value::as_i64).ok_or_else(|| {
            VerifyError::Query(format!(
                "COUNT(*) on {schema}.{table} returned no integer value"
            ))
        })?;
        tracing::debug!(schema, table, count, "counted rows");
        u64::try_from(count)
            .map_err(|_| VerifyError::Query(format!("negative row count for {schema}.{table}")))
    }

    /// Up to `limit` rows of `schema.table`
    fn preview(&self, schema: &str, table: &str, limit: usize) -> Result<QueryResult> {
        let sql = format!(
            "SELECT * FROM {} LIMIT {}",
            qualified_name(schema, table),
            limit
        );
        self.query(&sql, &[])
    }
}

/// Quote an identifier with double quotes, escaping embedded quotes
pub fn quote_ident(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// `"schema"."table"` with both parts quoted
pub fn qualified_name(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}
