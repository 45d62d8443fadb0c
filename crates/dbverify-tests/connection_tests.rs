//! Connection and catalog tests against fixture artifacts
//!
//! Covers read-only opening, rejection of missing or corrupt files and the
//! catalog listings the checks rely on.

#[cfg(test)]
mod tests {
    use crate::fixtures::{ArtifactBuilder, initialize_logging};
    use anyhow::Result;
    use dbverify_checks::{MarkerExpectation, read_generator_metadata};
    use dbverify_core::{Catalog, TableKind, VerifyError};
    use dbverify_driver_duckdb::DuckDbConnection;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_open_conforming_artifact() -> Result<()> {
        let artifact = ArtifactBuilder::new().build()?;
        let conn = artifact.open()?;

        assert_eq!(conn.driver_name(), "duckdb");
        assert_eq!(conn.path(), artifact.path());
        Ok(())
    }

    #[test]
    fn test_missing_file_is_a_connection_error() {
        initialize_logging();
        let dir = tempfile::tempdir().unwrap();
        let err = DuckDbConnection::open_read_only(dir.path().join("absent.duckdb")).unwrap_err();
        assert!(matches!(err, VerifyError::Connection(_)));
        assert_eq!(err.kind(), "ConnectionError");
    }

    #[test]
    fn test_open_does_not_create_the_file() {
        initialize_logging();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.duckdb");
        let _ = DuckDbConnection::open_read_only(&path);
        assert!(!path.exists());
    }

    #[test]
    fn test_non_database_file_is_a_connection_error() {
        initialize_logging();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.duckdb");
        std::fs::write(&path, "this is not a database\n".repeat(512)).unwrap();

        let err = DuckDbConnection::open_read_only(&path).unwrap_err();
        assert!(matches!(err, VerifyError::Connection(_)), "{err:?}");
    }

    #[test]
    fn test_session_rejects_writes() -> Result<()> {
        let artifact = ArtifactBuilder::new().build()?;
        let conn = artifact.open()?;

        let err = conn
            .query("CREATE TABLE raw.scratch (id INTEGER)", &[])
            .unwrap_err();
        assert!(matches!(err, VerifyError::Query(_)));
        assert!(!conn.table_exists("raw", "scratch")?);
        Ok(())
    }

    #[test]
    fn test_catalog_lists_converter_layout() -> Result<()> {
        let artifact = ArtifactBuilder::new().build()?;
        let conn = artifact.open()?;

        let schemas = conn.list_schemas()?;
        for expected in ["data", "main", "processed", "raw", "report"] {
            assert!(schemas.iter().any(|s| s == expected), "{schemas:?}");
        }

        assert_eq!(conn.list_tables("raw", Some(TableKind::BaseTable))?.len(), 19);
        assert_eq!(
            conn.list_tables("processed", Some(TableKind::View))?,
            vec!["classes", "memberships", "objects", "properties"]
        );
        assert!(conn.list_tables("processed", Some(TableKind::BaseTable))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_columns_come_back_in_declaration_order() -> Result<()> {
        let artifact = ArtifactBuilder::new()
            .with_extra_column("config", "extra_col")
            .build()?;
        let conn = artifact.open()?;

        let columns = conn.list_columns("raw", "config")?;
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["element", "value", "extra_col"]);
        assert_eq!(columns[0].ordinal, 1);
        assert_eq!(columns[2].data_type, "INTEGER");
        Ok(())
    }

    #[test]
    fn test_count_rows_and_preview() -> Result<()> {
        let artifact = ArtifactBuilder::new()
            .with_data_tables(&[("st__interval__nodes__price", 12)])
            .build()?;
        let conn = artifact.open()?;

        assert_eq!(conn.count_rows("data", "st__interval__nodes__price")?, 12);
        assert_eq!(conn.count_rows("raw", "config")?, 2);

        let preview = conn.preview("report", "st__interval__nodes__price", 5)?;
        assert_eq!(preview.row_count(), 5);
        assert_eq!(preview.column_names(), vec!["band", "block", "value"]);
        Ok(())
    }

    #[test]
    fn test_read_generator_metadata_from_artifact() -> Result<()> {
        let artifact = ArtifactBuilder::new().build()?;
        let conn = artifact.open()?;

        let metadata = read_generator_metadata(&conn, &MarkerExpectation::default())?;
        assert_eq!(metadata.generator_version(), Some("0.5.1-fixture"));
        assert_eq!(metadata.model_name(), Some("DAY_AHEAD"));
        assert_eq!(metadata.source_file(), Some("Model DAY_AHEAD Solution.zip"));
        assert!(metadata.created_at().is_some());
        let stats = metadata.run_stats()?.expect("run_stats is written");
        assert_eq!(stats["elapsed_seconds"], 12.5);
        Ok(())
    }

    #[test]
    fn test_read_generator_metadata_without_marker() -> Result<()> {
        let artifact = ArtifactBuilder::new().without_marker().build()?;
        let conn = artifact.open()?;

        let err = read_generator_metadata(&conn, &MarkerExpectation::default()).unwrap_err();
        assert_eq!(err.to_string(), "Missing main.plexos2duckdb");
        Ok(())
    }

    #[test]
    fn test_shared_handle_across_threads() -> Result<()> {
        let artifact = ArtifactBuilder::new().build()?;
        let conn = artifact.open()?;

        std::thread::scope(|scope| {
            let handles: Vec<_> = ["config", "bands", "objects"]
                .into_iter()
                .map(|table| {
                    let conn = &conn;
                    scope.spawn(move || conn.table_exists("raw", table))
                })
                .collect();
            for handle in handles {
                assert!(handle.join().unwrap().unwrap());
            }
        });
        Ok(())
    }
}
