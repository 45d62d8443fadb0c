//! Artifact fixtures for end-to-end verification tests.
//!
//! [`ArtifactBuilder`] writes a small DuckDB file laid out the way
//! `plexos2duckdb` lays out its output: the five schemas, the marker table,
//! every raw entity table, a few processed and report views and a set of
//! data tables. Builder methods remove or alter individual pieces so a
//! test can target a single check.
//!
//! # Usage
//!
//! ```rust,ignore
//! use dbverify_tests::fixtures::ArtifactBuilder;
//!
//! let artifact = ArtifactBuilder::new().without_table("bands").build()?;
//! let conn = artifact.open()?;
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dbverify_checks::EXPECTED_RAW_TABLES;
use dbverify_core::quote_ident;
use dbverify_driver_duckdb::DuckDbConnection;
use indoc::{formatdoc, indoc};
use tempfile::TempDir;

/// Schemas and marker table written before anything else
const BASE_DDL: &str = indoc! {"
    CREATE SCHEMA data;
    CREATE SCHEMA processed;
    CREATE SCHEMA raw;
    CREATE SCHEMA report;

    CREATE TABLE main.plexos2duckdb (
      key TEXT,
      value TEXT
    );
"};

/// Processed views, none of which depend on the raw tables
const PROCESSED_VIEWS: &[(&str, &str)] = &[
    (
        "classes",
        indoc! {"
            CREATE VIEW processed.classes AS
              SELECT * FROM (VALUES (1, 'Generator', 'Production'), (2, 'Region', 'Electric'))
                AS t(class_id, class, class_group);
        "},
    ),
    (
        "objects",
        indoc! {"
            CREATE VIEW processed.objects AS
              SELECT * FROM (VALUES (1, 'GEN_1', '-', 'Production', 'Generator'))
                AS t(id, name, category, class_group, class);
        "},
    ),
    (
        "properties",
        indoc! {"
            CREATE VIEW processed.properties AS
              SELECT * FROM (VALUES (1, false, 'Generators', 'Generation', 'MW'))
                AS t(property_id, is_summary, collection, property, unit);
        "},
    ),
    (
        "memberships",
        indoc! {"
            CREATE VIEW processed.memberships AS
              SELECT * FROM (VALUES (1, 'Generators', 'GEN_1', '-'))
                AS t(membership_id, collection, child_name, child_category);
        "},
    ),
];

/// Data table written by default, as `(name, rows)`
pub const DEFAULT_DATA_TABLES: &[(&str, usize)] = &[
    ("st__interval__generators__generation", 24),
    ("st__interval__regions__load", 24),
];

/// Name of the view [`ArtifactBuilder::with_broken_report_view`] adds
pub const BROKEN_VIEW: &str = "a_broken_view";

/// SQL type of a raw column, following the converter's naming
fn column_type(column: &str) -> &'static str {
    if column.starts_with("is_") {
        "BOOLEAN"
    } else if column.ends_with("_id")
        || matches!(column, "index" | "rank" | "position" | "length" | "period_offset")
    {
        "BIGINT"
    } else if column == "sample_weight" {
        "DOUBLE"
    } else {
        "VARCHAR"
    }
}

/// Builder for a plexos2duckdb-shaped DuckDB file
#[derive(Debug, Clone)]
pub struct ArtifactBuilder {
    omitted_tables: HashSet<String>,
    omitted_columns: HashSet<(String, String)>,
    extra_columns: Vec<(String, String)>,
    dropped_schemas: Vec<String>,
    marker: bool,
    processed_views: usize,
    report_views: bool,
    broken_report_view: bool,
    data_tables: Vec<(String, usize)>,
}

impl Default for ArtifactBuilder {
    fn default() -> Self {
        Self {
            omitted_tables: HashSet::new(),
            omitted_columns: HashSet::new(),
            extra_columns: Vec::new(),
            dropped_schemas: Vec::new(),
            marker: true,
            processed_views: PROCESSED_VIEWS.len(),
            report_views: true,
            broken_report_view: false,
            data_tables: DEFAULT_DATA_TABLES
                .iter()
                .map(|(name, rows)| (name.to_string(), *rows))
                .collect(),
        }
    }
}

impl ArtifactBuilder {
    /// A conforming artifact
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave out the raw table `table`
    pub fn without_table(mut self, table: &str) -> Self {
        self.omitted_tables.insert(table.to_string());
        self
    }

    /// Leave out one column of a raw table
    pub fn without_column(mut self, table: &str, column: &str) -> Self {
        self.omitted_columns
            .insert((table.to_string(), column.to_string()));
        self
    }

    /// Add an INTEGER column to a raw table
    pub fn with_extra_column(mut self, table: &str, column: &str) -> Self {
        self.extra_columns
            .push((table.to_string(), column.to_string()));
        self
    }

    /// Drop a whole schema (and everything in it) after building
    pub fn without_schema(mut self, schema: &str) -> Self {
        self.dropped_schemas.push(schema.to_string());
        self
    }

    /// Do not write the `main.plexos2duckdb` marker table
    pub fn without_marker(mut self) -> Self {
        self.marker = false;
        self
    }

    /// Write only the first `count` processed views
    pub fn with_processed_views(mut self, count: usize) -> Self {
        self.processed_views = count.min(PROCESSED_VIEWS.len());
        self
    }

    /// Do not create report views
    pub fn without_report_views(mut self) -> Self {
        self.report_views = false;
        self
    }

    /// Add a report view that sorts first and fails when selected from
    pub fn with_broken_report_view(mut self) -> Self {
        self.broken_report_view = true;
        self
    }

    /// Replace the data tables, as `(name, rows)`
    pub fn with_data_tables(mut self, tables: &[(&str, usize)]) -> Self {
        self.data_tables = tables
            .iter()
            .map(|(name, rows)| (name.to_string(), *rows))
            .collect();
        self
    }

    /// Keep the data tables but remove all their rows
    pub fn with_empty_data(mut self) -> Self {
        for (_, rows) in &mut self.data_tables {
            *rows = 0;
        }
        self
    }

    /// Full SQL script that creates the artifact
    pub fn sql(&self) -> String {
        let mut sql = String::from(BASE_DDL);

        if self.marker {
            sql.push_str(&marker_rows());
        } else {
            sql.push_str("DROP TABLE main.plexos2duckdb;\n");
        }

        for (table, columns) in EXPECTED_RAW_TABLES {
            if !self.omitted_tables.contains(*table) {
                sql.push_str(&self.raw_table_ddl(table, columns));
            }
        }

        for (_, ddl) in PROCESSED_VIEWS.iter().take(self.processed_views) {
            sql.push_str(ddl);
        }

        for (name, rows) in &self.data_tables {
            sql.push_str(&data_table_ddl(name, *rows));
        }

        if self.report_views {
            sql.push_str(&self.report_views_ddl());
        }
        if self.broken_report_view {
            sql.push_str(&format!(
                "CREATE VIEW report.{} AS SELECT error('view is broken') AS value;\n",
                quote_ident(BROKEN_VIEW)
            ));
        }

        for schema in &self.dropped_schemas {
            sql.push_str(&format!("DROP SCHEMA {} CASCADE;\n", quote_ident(schema)));
        }
        sql
    }

    /// Write the artifact to `path`, which must not exist yet
    pub fn build_at(&self, path: &Path) -> Result<()> {
        let conn = duckdb::Connection::open(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        conn.execute_batch(&self.sql())
            .context("failed to run fixture script")?;
        Ok(())
    }

    /// Write the artifact into a fresh temporary directory
    pub fn build(&self) -> Result<TestArtifact> {
        initialize_logging();
        let dir = tempfile::tempdir().context("failed to create temp dir")?;
        let path = dir.path().join("model.duckdb");
        self.build_at(&path)?;
        Ok(TestArtifact { _dir: dir, path })
    }

    fn raw_table_ddl(&self, table: &str, columns: &[&str]) -> String {
        let mut definitions: Vec<String> = columns
            .iter()
            .filter(|c| {
                !self
                    .omitted_columns
                    .contains(&(table.to_string(), c.to_string()))
            })
            .map(|c| format!("  {} {}", quote_ident(c), column_type(c)))
            .collect();
        definitions.extend(
            self.extra_columns
                .iter()
                .filter(|(t, _)| t == table)
                .map(|(_, c)| format!("  {} INTEGER", quote_ident(c))),
        );
        if definitions.is_empty() {
            definitions.push("  placeholder INTEGER".to_string());
        }

        let mut ddl = format!(
            "CREATE TABLE raw.{} (\n{}\n);\n",
            quote_ident(table),
            definitions.join(",\n")
        );
        if table == "config" {
            ddl.push_str(&self.config_rows());
        }
        ddl
    }

    fn config_rows(&self) -> String {
        let mut columns = vec!["element", "value"];
        columns.retain(|c| {
            !self
                .omitted_columns
                .contains(&("config".to_string(), c.to_string()))
        });
        if columns.len() < 2 {
            return String::new();
        }
        "INSERT INTO raw.config (element, value) VALUES ('Version', '9.200 R06'), ('Locale', 'en-US');\n"
            .to_string()
    }

    fn report_views_ddl(&self) -> String {
        match self.data_tables.first() {
            Some((table, _)) => formatdoc!(
                "
                    CREATE VIEW report.{view} AS SELECT
                      d.band_id AS band,
                      d.block_id AS block,
                      d.value AS value
                    FROM data.{table} d
                    ORDER BY d.band_id, d.block_id;
                ",
                view = quote_ident(table),
                table = quote_ident(table),
            ),
            None => "CREATE VIEW report.\"st__interval__empty\" AS SELECT 1 AS band WHERE false;\n"
                .to_string(),
        }
    }
}

fn marker_rows() -> String {
    let created = chrono::Utc::now().to_string();
    formatdoc!(
        "
            INSERT INTO main.plexos2duckdb VALUES
              ('plexos2duckdb_version', '0.5.1-fixture'),
              ('duckdb_file_created_at', '{created}'),
              ('plexos_file', 'Model DAY_AHEAD Solution.zip'),
              ('model_name', 'DAY_AHEAD'),
              ('run_stats', '{{\"elapsed_seconds\": 12.5}}');
        ",
        created = created,
    )
}

fn data_table_ddl(name: &str, rows: usize) -> String {
    let table = quote_ident(name);
    let mut ddl = formatdoc!(
        "
            CREATE TABLE data.{table} (
              key_id BIGINT,
              sample_id BIGINT,
              band_id BIGINT,
              membership_id BIGINT,
              block_id BIGINT,
              value DOUBLE
            );
        ",
        table = table,
    );
    if rows > 0 {
        ddl.push_str(&format!(
            "INSERT INTO data.{table} SELECT 1, 1, 1, 1, i + 1, i * 1.5 FROM range({rows}) t(i);\n",
        ));
    }
    ddl
}

/// A built artifact; the file is removed when this is dropped
#[derive(Debug)]
pub struct TestArtifact {
    _dir: TempDir,
    path: PathBuf,
}

impl TestArtifact {
    /// Location of the DuckDB file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the artifact read-only
    pub fn open(&self) -> Result<DuckDbConnection> {
        DuckDbConnection::open_read_only(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))
    }
}

/// Install a test-writer subscriber once per process
pub fn initialize_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("dbverify_checks=debug,dbverify_driver_duckdb=debug")
            });
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .finish();

        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_column_types_follow_converter_ddl() {
        assert_eq!(column_type("class_id"), "BIGINT");
        assert_eq!(column_type("index"), "BIGINT");
        assert_eq!(column_type("is_show"), "BOOLEAN");
        assert_eq!(column_type("sample_weight"), "DOUBLE");
        assert_eq!(column_type("name"), "VARCHAR");
    }

    #[test]
    fn test_sql_respects_omissions() {
        let sql = ArtifactBuilder::new()
            .without_table("bands")
            .without_column("classes", "class_group_id")
            .sql();
        assert!(!sql.contains("CREATE TABLE raw.\"bands\""));
        assert!(sql.contains("CREATE TABLE raw.\"classes\""));
        assert!(!sql.contains("\"class_group_id\" BIGINT"));
    }

    #[test]
    fn test_processed_view_count_is_capped() {
        let builder = ArtifactBuilder::new().with_processed_views(10);
        assert_eq!(builder.processed_views, PROCESSED_VIEWS.len());
    }
}
