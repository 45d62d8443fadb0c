//! Generator metadata stored in the marker table
//!
//! The converter stamps `main.plexos2duckdb` with `key`/`value` rows
//! describing the tool version, creation time and the source model.

use chrono::{DateTime, NaiveDateTime, Utc};
use dbverify_core::{Catalog, Result, VerifyError, qualified_name};
use indexmap::IndexMap;
use serde::Serialize;

use crate::expectations::MarkerExpectation;

pub const KEY_GENERATOR_VERSION: &str = "plexos2duckdb_version";
pub const KEY_CREATED_AT: &str = "duckdb_file_created_at";
pub const KEY_SOURCE_FILE: &str = "plexos_file";
pub const KEY_MODEL_NAME: &str = "model_name";
pub const KEY_SIMULATION_LOG: &str = "simulation_log";
pub const KEY_RUN_STATS: &str = "run_stats";

/// Key/value pairs read from the marker table, in table order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeneratorMetadata {
    entries: IndexMap<String, Option<String>>,
}

impl GeneratorMetadata {
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<String>)>,
        K: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Value stored under `key`; NULL values read as `None`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(|v| v.as_deref())
    }

    pub fn generator_version(&self) -> Option<&str> {
        self.get(KEY_GENERATOR_VERSION)
    }

    pub fn model_name(&self) -> Option<&str> {
        self.get(KEY_MODEL_NAME)
    }

    pub fn source_file(&self) -> Option<&str> {
        self.get(KEY_SOURCE_FILE)
    }

    pub fn simulation_log(&self) -> Option<&str> {
        self.get(KEY_SIMULATION_LOG)
    }

    /// Creation timestamp, written as `YYYY-MM-DD HH:MM:SS.fffffffff UTC`
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.get(KEY_CREATED_AT)?;
        let trimmed = raw.trim().trim_end_matches("UTC").trim_end();
        NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// The solver run statistics, stored as a JSON document
    pub fn run_stats(&self) -> Result<Option<serde_json::Value>> {
        self.get(KEY_RUN_STATS)
            .map(|raw| {
                serde_json::from_str(raw)
                    .map_err(|e| VerifyError::Query(format!("run_stats is not valid JSON: {}", e)))
            })
            .transpose()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read every key/value row of the marker table
#[tracing::instrument(skip(catalog))]
pub fn read_generator_metadata(
    catalog: &dyn Catalog,
    marker: &MarkerExpectation,
) -> Result<GeneratorMetadata> {
    if !catalog.table_exists(&marker.schema, &marker.table)? {
        return Err(VerifyError::MissingMarker {
            schema: marker.schema.clone(),
            table: marker.table.clone(),
        });
    }

    let sql = format!(
        "SELECT key, value FROM {}",
        qualified_name(&marker.schema, &marker.table)
    );
    let result = catalog.query(&sql, &[])?;

    let metadata = GeneratorMetadata::from_entries(result.rows.iter().filter_map(|row| {
        let key = row.get_by_name("key")?.as_str()?.to_string();
        let value = row
            .get_by_name("value")
            .filter(|v| !v.is_null())
            .map(|v| v.to_string());
        Some((key, value))
    }));
    tracing::debug!(entries = metadata.len(), "read generator metadata");
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeCatalog;
    use dbverify_core::Value;
    use pretty_assertions::assert_eq;

    fn marker_catalog() -> FakeCatalog {
        FakeCatalog::new()
            .with_table("main", "plexos2duckdb", &["key", "value"], 4)
            .with_rows(
                "SELECT key, value FROM \"main\".\"plexos2duckdb\"",
                &["key", "value"],
                vec![
                    vec![Value::from("plexos2duckdb_version"), Value::from("0.5.1-g1a2b3c")],
                    vec![
                        Value::from("duckdb_file_created_at"),
                        Value::from("2025-03-04 10:11:12.123456789 UTC"),
                    ],
                    vec![Value::from("plexos_file"), Value::Null],
                    vec![Value::from("model_name"), Value::from("DAY_AHEAD")],
                    vec![Value::from("run_stats"), Value::from(r#"{"elapsed": 12.5}"#)],
                ],
            )
    }

    #[test]
    fn test_read_generator_metadata() {
        let catalog = marker_catalog();
        let metadata = read_generator_metadata(&catalog, &MarkerExpectation::default()).unwrap();

        assert_eq!(metadata.len(), 5);
        assert_eq!(metadata.generator_version(), Some("0.5.1-g1a2b3c"));
        assert_eq!(metadata.model_name(), Some("DAY_AHEAD"));
        assert_eq!(metadata.source_file(), None);
        assert_eq!(metadata.simulation_log(), None);
        let keys: Vec<&str> = metadata.iter().map(|(k, _)| k).collect();
        assert_eq!(keys[0], "plexos2duckdb_version");
    }

    #[test]
    fn test_created_at_parses_utc_display_format() {
        let metadata = read_generator_metadata(&marker_catalog(), &MarkerExpectation::default())
            .unwrap();
        let created = metadata.created_at().unwrap();
        assert_eq!(created.to_rfc3339(), "2025-03-04T10:11:12.123456789+00:00");
    }

    #[test]
    fn test_run_stats_json() {
        let metadata = read_generator_metadata(&marker_catalog(), &MarkerExpectation::default())
            .unwrap();
        let stats = metadata.run_stats().unwrap().unwrap();
        assert_eq!(stats["elapsed"], serde_json::json!(12.5));
    }

    #[test]
    fn test_invalid_run_stats_is_an_error() {
        let metadata =
            GeneratorMetadata::from_entries([("run_stats", Some("not json".to_string()))]);
        assert!(metadata.run_stats().is_err());
        assert!(GeneratorMetadata::default().run_stats().unwrap().is_none());
    }

    #[test]
    fn test_missing_marker_table() {
        let catalog = FakeCatalog::new();
        let err = read_generator_metadata(&catalog, &MarkerExpectation::default()).unwrap_err();
        assert_eq!(err.kind(), "MissingMarkerError");
        assert_eq!(err.to_string(), "Missing main.plexos2duckdb");
    }
}
