//! DuckDB catalog introspection implementation

use dbverify_core::{Catalog, ColumnInfo, QueryResult, Result, TableKind, Value, VerifyError};

use super::DuckDbConnection;

impl Catalog for DuckDbConnection {
    fn driver_name(&self) -> &str {
        "duckdb"
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        self.execute_query(sql, params)
    }

    fn list_schemas(&self) -> Result<Vec<String>> {
        let result = self.query(
            "SELECT DISTINCT table_schema FROM information_schema.tables
             WHERE table_catalog = current_database() ORDER BY 1",
            &[],
        )?;

        Ok(string_column(&result))
    }

    fn list_tables(&self, schema: &str, kind: Option<TableKind>) -> Result<Vec<String>> {
        let result = match kind {
            Some(kind) => self.query(
                "SELECT table_name FROM information_schema.tables
                 WHERE table_catalog = current_database()
                   AND table_schema = ? AND table_type = ?
                 ORDER BY table_name",
                &[schema.into(), kind.information_schema_type().into()],
            )?,
            None => self.query(
                "SELECT table_name FROM information_schema.tables
                 WHERE table_catalog = current_database() AND table_schema = ?
                 ORDER BY table_name",
                &[schema.into()],
            )?,
        };

        Ok(string_column(&result))
    }

    fn list_columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnInfo>> {
        let result = self.query(
            "SELECT column_name, ordinal_position, data_type, is_nullable
             FROM information_schema.columns
             WHERE table_catalog = current_database()
               AND table_schema = ? AND table_name = ?
             ORDER BY ordinal_position",
            &[schema.into(), table.into()],
        )?;

        Ok(result
            .rows
            .iter()
            .map(|row| ColumnInfo {
                name: row
                    .get(0)
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                ordinal: row.get(1).and_then(|v| v.as_i64()).unwrap_or(0) as usize,
                data_type: row
                    .get(2)
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                nullable: row.get(3).and_then(|v| v.as_str()) != Some("NO"),
            })
            .collect())
    }

    fn table_exists(&self, schema: &str, table: &str) -> Result<bool> {
        let result = self.query(
            "SELECT COUNT(*) FROM information_schema.tables
             WHERE table_catalog = current_database()
               AND table_schema = ? AND table_name = ?",
            &[schema.into(), table.into()],
        )?;

        let count = result.scalar().and_then(Value::as_i64).ok_or_else(|| {
            VerifyError::Query(format!("existence probe for {schema}.{table} returned no count"))
        })?;
        Ok(count > 0)
    }
}

fn string_column(result: &QueryResult) -> Vec<String> {
    result
        .rows
        .iter()
        .filter_map(|row| row.get(0).and_then(|v| v.as_str()).map(|s| s.to_string()))
        .collect()
}
