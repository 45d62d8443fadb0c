//! DuckDB connection implementation

use dbverify_core::{ColumnMeta, QueryResult, Result, Row, Value, VerifyError};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

/// Read-only DuckDB session over a single database file
///
/// The underlying connection is guarded by a mutex so one handle can be
/// shared across test threads.
pub struct DuckDbConnection {
    connection: Mutex<duckdb::Connection>,
    path: PathBuf,
}

impl DuckDbConnection {
    /// Wrap an already opened DuckDB connection
    pub fn new(connection: duckdb::Connection, path: impl Into<PathBuf>) -> Self {
        Self {
            connection: Mutex::new(connection),
            path: path.into(),
        }
    }

    /// Open the database file at `path` in read-only access mode.
    ///
    /// Fails with `VerifyError::Connection` when the file is missing or is
    /// not a DuckDB database.
    #[tracing::instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(VerifyError::Connection(format!(
                "database file not found: {}",
                path.display()
            )));
        }

        let config = duckdb::Config::default()
            .access_mode(duckdb::AccessMode::ReadOnly)
            .map_err(|e| VerifyError::Connection(format!("Invalid DuckDB config: {}", e)))?;

        let connection = duckdb::Connection::open_with_flags(path, config).map_err(|e| {
            VerifyError::Connection(format!(
                "Failed to open DuckDB database {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::debug!("opened DuckDB database read-only");
        Ok(Self::new(connection, path))
    }

    /// Get the database path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Version string of the embedded engine
    pub fn engine_version(&self) -> Result<String> {
        let result = self.execute_query("SELECT version()", &[])?;
        result
            .scalar()
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| VerifyError::Query("version() returned no value".into()))
    }

    pub(crate) fn execute_query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let start = std::time::Instant::now();

        let conn = self
            .connection
            .lock()
            .map_err(|e| VerifyError::Driver(format!("Lock poisoned: {}", e)))?;

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| VerifyError::Query(format!("Prepare failed: {}", e)))?;

        let mut duckdb_rows = stmt
            .query(duckdb::params_from_iter(params.iter().map(to_duckdb_value)))
            .map_err(|e| VerifyError::Query(format!("Query failed: {}", e)))?;

        // Column names are only known once the statement has executed
        let column_names: Vec<String> = duckdb_rows
            .as_ref()
            .map(|r| r.column_names().iter().map(|s| s.to_string()).collect())
            .unwrap_or_default();
        let column_count = column_names.len();

        let columns: Vec<ColumnMeta> = column_names
            .iter()
            .enumerate()
            .map(|(idx, name)| ColumnMeta {
                name: name.clone(),
                ordinal: idx,
            })
            .collect();

        let mut rows: Vec<Row> = Vec::new();
        while let Some(row) = duckdb_rows
            .next()
            .map_err(|e| VerifyError::Query(format!("Row fetch failed: {}", e)))?
        {
            let values = (0..column_count).map(|i| row_to_value(row, i)).collect();
            rows.push(Row::new(column_names.clone(), values));
        }

        let id = Uuid::new_v4();
        let execution_time_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            query_id = %id,
            row_count = rows.len(),
            duration_ms = execution_time_ms,
            "query completed"
        );

        Ok(QueryResult {
            id,
            columns,
            rows,
            execution_time_ms,
        })
    }
}

fn to_duckdb_value(value: &Value) -> duckdb::types::Value {
    match value {
        Value::Null => duckdb::types::Value::Null,
        Value::Bool(v) => duckdb::types::Value::Boolean(*v),
        Value::Int64(v) => duckdb::types::Value::BigInt(*v),
        Value::Float64(v) => duckdb::types::Value::Double(*v),
        Value::String(v) => duckdb::types::Value::Text(v.clone()),
        Value::Bytes(v) => duckdb::types::Value::Blob(v.clone()),
    }
}

fn row_to_value(row: &duckdb::Row, idx: usize) -> Value {
    if let Ok(v) = row.get::<_, Option<i64>>(idx) {
        return v.map_or(Value::Null, Value::Int64);
    }
    if let Ok(v) = row.get::<_, Option<f64>>(idx) {
        return v.map_or(Value::Null, Value::Float64);
    }
    if let Ok(v) = row.get::<_, Option<String>>(idx) {
        return v.map_or(Value::Null, Value::String);
    }
    if let Ok(v) = row.get::<_, Option<bool>>(idx) {
        return v.map_or(Value::Null, Value::Bool);
    }
    if let Ok(v) = row.get::<_, Option<Vec<u8>>>(idx) {
        return v.map_or(Value::Null, Value::Bytes);
    }
    // Timestamps, lists and other nested types are not decoded
    Value::Null
}

impl std::fmt::Debug for DuckDbConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbConnection")
            .field("path", &self.path)
            .finish()
    }
}
