//! Unit tests for the DuckDB driver

use super::*;
use dbverify_core::{Catalog, TableKind, Value, VerifyError};
use pretty_assertions::assert_eq;

const SETUP: &str = "
    CREATE SCHEMA raw;
    CREATE SCHEMA report;
    CREATE SCHEMA empty_ns;
    CREATE TABLE raw.config (element VARCHAR, value VARCHAR, extra_col INTEGER);
    CREATE TABLE raw.bands (band_id BIGINT);
    INSERT INTO raw.config VALUES ('Version', '9.2', 1), ('Locale', 'en', 2), ('Unit', 'MW', 3);
    CREATE VIEW report.b_view AS SELECT element FROM raw.config;
    CREATE VIEW report.a_view AS SELECT band_id FROM raw.bands;
";

fn memory_connection() -> DuckDbConnection {
    let conn = duckdb::Connection::open_in_memory().unwrap();
    conn.execute_batch(SETUP).unwrap();
    DuckDbConnection::new(conn, ":memory:")
}

fn write_database(path: &std::path::Path) {
    let conn = duckdb::Connection::open(path).unwrap();
    conn.execute_batch(SETUP).unwrap();
}

#[test]
fn test_duckdb_driver_name() {
    let conn = memory_connection();
    assert_eq!(conn.driver_name(), "duckdb");
}

#[test]
fn test_duckdb_connection_path() {
    let conn = memory_connection();
    assert_eq!(conn.path(), std::path::Path::new(":memory:"));
}

#[test]
fn test_list_schemas_skips_empty_schemas() {
    let conn = memory_connection();
    assert_eq!(
        conn.list_schemas().unwrap(),
        vec!["raw".to_string(), "report".to_string()]
    );
}

#[test]
fn test_list_schemas_of_database_without_tables_is_empty() {
    let conn = duckdb::Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE SCHEMA data; CREATE SCHEMA processed; CREATE SCHEMA raw; CREATE SCHEMA report;",
    )
    .unwrap();
    let conn = DuckDbConnection::new(conn, ":memory:");

    assert!(conn.list_schemas().unwrap().is_empty());
}

#[test]
fn test_list_tables_filters_by_kind_and_sorts() {
    let conn = memory_connection();

    assert_eq!(
        conn.list_tables("raw", Some(TableKind::BaseTable)).unwrap(),
        vec!["bands".to_string(), "config".to_string()]
    );
    assert!(conn.list_tables("raw", Some(TableKind::View)).unwrap().is_empty());
    assert_eq!(
        conn.list_tables("report", Some(TableKind::View)).unwrap(),
        vec!["a_view".to_string(), "b_view".to_string()]
    );
    assert_eq!(conn.list_tables("report", None).unwrap().len(), 2);
}

#[test]
fn test_list_columns_in_physical_order() {
    let conn = memory_connection();
    let columns = conn.list_columns("raw", "config").unwrap();
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["element", "value", "extra_col"]);
    assert_eq!(columns[0].ordinal, 1);
    assert_eq!(columns[2].data_type, "INTEGER");
    assert!(columns[0].nullable);
}

#[test]
fn test_list_columns_of_unknown_table_is_empty() {
    let conn = memory_connection();
    assert!(conn.list_columns("raw", "nope").unwrap().is_empty());
}

#[test]
fn test_table_exists() {
    let conn = memory_connection();
    assert!(conn.table_exists("raw", "config").unwrap());
    assert!(conn.table_exists("report", "a_view").unwrap());
    assert!(!conn.table_exists("raw", "memberships").unwrap());
    assert!(!conn.table_exists("report", "config").unwrap());
}

#[test]
fn test_count_rows() {
    let conn = memory_connection();
    assert_eq!(conn.count_rows("raw", "config").unwrap(), 3);
    assert_eq!(conn.count_rows("raw", "bands").unwrap(), 0);
}

#[test]
fn test_preview_is_bounded() {
    let conn = memory_connection();
    let result = conn.preview("raw", "config", 2).unwrap();
    assert_eq!(result.row_count(), 2);
    assert_eq!(result.column_names(), vec!["element", "value", "extra_col"]);
}

#[test]
fn test_preview_of_empty_view_returns_empty_row_set() {
    let conn = memory_connection();
    let result = conn.preview("report", "a_view", 5).unwrap();
    assert_eq!(result.row_count(), 0);
    assert_eq!(result.column_names(), vec!["band_id"]);
}

#[test]
fn test_query_binds_parameters() {
    let conn = memory_connection();
    let result = conn
        .query(
            "SELECT value FROM raw.config WHERE element = ?",
            &[Value::from("Locale")],
        )
        .unwrap();
    assert_eq!(result.scalar(), Some(&Value::from("en")));
}

#[test]
fn test_query_error_is_reported() {
    let conn = memory_connection();
    let err = conn.query("SELECT * FROM raw.does_not_exist", &[]).unwrap_err();
    assert!(matches!(err, VerifyError::Query(_)));
}

#[test]
fn test_engine_version() {
    let conn = memory_connection();
    let version = conn.engine_version().unwrap();
    assert!(version.starts_with('v'), "unexpected version {version}");
}

#[test]
fn test_open_read_only_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = DuckDbConnection::open_read_only(dir.path().join("missing.duckdb")).unwrap_err();
    assert!(matches!(err, VerifyError::Connection(_)));
    assert!(err.to_string().contains("not found"));
}

#[test]
fn test_open_read_only_rejects_non_duckdb_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.duckdb");
    std::fs::write(&path, "this is not a database file\n".repeat(512)).unwrap();

    let err = DuckDbConnection::open_read_only(&path).unwrap_err();
    assert!(matches!(err, VerifyError::Connection(_)));
}

#[test]
fn test_open_read_only_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("artifact.duckdb");
    write_database(&path);

    let conn = DuckDbConnection::open_read_only(&path).unwrap();
    assert_eq!(conn.path(), path.as_path());
    assert_eq!(conn.count_rows("raw", "config").unwrap(), 3);
}

#[test]
fn test_open_read_only_refuses_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("artifact.duckdb");
    write_database(&path);

    let conn = DuckDbConnection::open_read_only(&path).unwrap();
    assert!(conn.query("CREATE TABLE raw.scratch (id INTEGER)", &[]).is_err());
    assert!(conn.query("DELETE FROM raw.config", &[]).is_err());
    assert_eq!(conn.count_rows("raw", "config").unwrap(), 3);
}
