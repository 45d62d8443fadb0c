//! Expectation profiles
//!
//! The built-in profile describes the layout written by `plexos2duckdb`.
//! A TOML profile can replace any part of it; sections that are left out
//! keep their built-in values.

use std::path::Path;

use dbverify_core::{Result, VerifyError};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Schemas every artifact must contain
pub const EXPECTED_SCHEMAS: &[&str] = &["data", "main", "processed", "raw", "report"];

/// Schema holding the raw entity tables
pub const RAW_SCHEMA: &str = "raw";

/// Required columns of each raw table (superset check)
pub const EXPECTED_RAW_TABLES: &[(&str, &[&str])] = &[
    ("config", &["element", "value"]),
    (
        "memberships",
        &[
            "membership_id",
            "collection_id",
            "collection",
            "child_id",
            "child_name",
            "child_category",
            "child_category_class",
            "parent_id",
            "parent_name",
            "parent_category",
            "parent_category_class",
            "child_class_id",
            "child_class_name",
            "parent_class_id",
            "parent_class_name",
            "kind",
        ],
    ),
    (
        "collections",
        &[
            "collection_id",
            "parent_class_id",
            "child_class_id",
            "name",
            "complement_name",
        ],
    ),
    ("classes", &["class_id", "name", "class_group_id"]),
    ("class_groups", &["class_group_id", "name"]),
    ("categories", &["category_id", "class_id", "rank", "name"]),
    ("bands", &["band_id"]),
    ("models", &["model_id", "name"]),
    (
        "objects",
        &["object_id", "class_id", "name", "category_id", "index", "is_show"],
    ),
    (
        "keys",
        &[
            "key_id",
            "membership_id",
            "model_id",
            "phase_id",
            "property_id",
            "is_summary",
            "band_id",
            "sample_id",
            "timeslice_id",
        ],
    ),
    (
        "key_indexes",
        &["key_id", "period_type_id", "position", "length", "period_offset"],
    ),
    (
        "properties",
        &[
            "property_id",
            "name",
            "summary_name",
            "enum_id",
            "unit_id",
            "summary_unit_id",
            "is_multi_band",
            "is_period",
            "is_summary",
            "collection_id",
        ],
    ),
    ("timeslices", &["timeslice_id", "timeslice_name"]),
    (
        "samples",
        &["sample_id", "sample_name", "sample_phase_id", "sample_weight"],
    ),
    ("units", &["unit_id", "unit_name", "lang_id"]),
    ("memo_objects", &["value", "column_id", "object_id"]),
    ("custom_columns", &["column_id", "name", "position", "class_id"]),
    ("attribute_data", &["object_id", "attribute_id", "value"]),
    (
        "attributes",
        &["attribute_id", "name", "lang_id", "class_id", "description"],
    ),
];

/// Schema of the generator marker table
pub const MARKER_SCHEMA: &str = "main";
/// Table stamped by the generating tool
pub const MARKER_TABLE: &str = "plexos2duckdb";

pub const PROCESSED_SCHEMA: &str = "processed";
pub const PROCESSED_MIN_VIEWS: usize = 3;
pub const REPORT_SCHEMA: &str = "report";
pub const REPORT_MIN_VIEWS: usize = 1;

pub const DATA_SCHEMA: &str = "data";
/// How many data tables are row-counted before giving up
pub const DATA_SAMPLE_LIMIT: usize = 5;
/// Row limit of the view queryability probe
pub const PREVIEW_LIMIT: usize = 5;

/// The built-in profile, built once per process
pub static PLEXOS_EXPECTATIONS: Lazy<Expectations> = Lazy::new(Expectations::plexos);

/// Marker table that identifies the generating tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkerExpectation {
    pub schema: String,
    pub table: String,
}

impl Default for MarkerExpectation {
    fn default() -> Self {
        Self {
            schema: MARKER_SCHEMA.to_string(),
            table: MARKER_TABLE.to_string(),
        }
    }
}

/// Required columns per table, all in one schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableExpectations {
    pub schema: String,
    pub columns: IndexMap<String, Vec<String>>,
}

impl Default for TableExpectations {
    fn default() -> Self {
        Self {
            schema: RAW_SCHEMA.to_string(),
            columns: EXPECTED_RAW_TABLES
                .iter()
                .map(|(table, columns)| {
                    (
                        table.to_string(),
                        columns.iter().map(|c| c.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }
}

/// Minimum number of views a schema must expose
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewExpectation {
    pub schema: String,
    pub minimum: usize,
}

impl ViewExpectation {
    pub fn new(schema: impl Into<String>, minimum: usize) -> Self {
        Self {
            schema: schema.into(),
            minimum,
        }
    }
}

/// Sampling check over the base tables of a schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataExpectation {
    pub schema: String,
    pub sample_limit: usize,
}

impl Default for DataExpectation {
    fn default() -> Self {
        Self {
            schema: DATA_SCHEMA.to_string(),
            sample_limit: DATA_SAMPLE_LIMIT,
        }
    }
}

/// Bounded query against the first view of a schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewExpectation {
    pub schema: String,
    pub limit: usize,
}

impl Default for PreviewExpectation {
    fn default() -> Self {
        Self {
            schema: REPORT_SCHEMA.to_string(),
            limit: PREVIEW_LIMIT,
        }
    }
}

/// Everything a verification run asserts about an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Expectations {
    pub schemas: Vec<String>,
    pub marker: MarkerExpectation,
    pub tables: TableExpectations,
    pub views: Vec<ViewExpectation>,
    pub data: DataExpectation,
    pub preview: PreviewExpectation,
}

impl Default for Expectations {
    fn default() -> Self {
        PLEXOS_EXPECTATIONS.clone()
    }
}

impl Expectations {
    /// The `plexos2duckdb` layout
    pub fn plexos() -> Self {
        Self {
            schemas: EXPECTED_SCHEMAS.iter().map(|s| s.to_string()).collect(),
            marker: MarkerExpectation::default(),
            tables: TableExpectations::default(),
            views: vec![
                ViewExpectation::new(PROCESSED_SCHEMA, PROCESSED_MIN_VIEWS),
                ViewExpectation::new(REPORT_SCHEMA, REPORT_MIN_VIEWS),
            ],
            data: DataExpectation::default(),
            preview: PreviewExpectation::default(),
        }
    }

    /// Parse a TOML profile and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let expectations: Self = toml::from_str(content)
            .map_err(|e| VerifyError::Configuration(format!("invalid expectation profile: {}", e)))?;
        expectations.validate()?;
        Ok(expectations)
    }

    /// Load a TOML profile from disk
    #[tracing::instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let expectations = Self::from_toml_str(&content).map_err(|e| match e {
            VerifyError::Configuration(msg) => {
                VerifyError::Configuration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
        tracing::debug!(
            tables = expectations.tables.columns.len(),
            views = expectations.views.len(),
            "loaded expectation profile"
        );
        Ok(expectations)
    }

    /// Serialize the profile back to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| VerifyError::Configuration(format!("cannot serialize profile: {}", e)))
    }

    /// Reject profiles that can never be evaluated meaningfully
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = self.schemas.iter().find(|s| s.trim().is_empty()) {
            return Err(VerifyError::Configuration(format!(
                "schema names must not be blank (got {:?})",
                name
            )));
        }
        if self.marker.schema.is_empty() || self.marker.table.is_empty() {
            return Err(VerifyError::Configuration(
                "marker schema and table must be set".into(),
            ));
        }
        if self.tables.schema.is_empty() {
            return Err(VerifyError::Configuration("tables.schema must be set".into()));
        }
        if let Some(table) = self.tables.columns.keys().find(|t| t.trim().is_empty()) {
            return Err(VerifyError::Configuration(format!(
                "table names must not be blank (got {:?})",
                table
            )));
        }
        if self.data.sample_limit == 0 {
            return Err(VerifyError::Configuration(
                "data.sample_limit must be at least 1".into(),
            ));
        }
        if self.preview.limit == 0 {
            return Err(VerifyError::Configuration(
                "preview.limit must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Replaces the expected schema set
    pub fn with_schemas<I, S>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schemas = schemas.into_iter().map(Into::into).collect();
        self
    }

    /// Adds or replaces the required columns of a table
    pub fn with_table<I, S>(mut self, table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables
            .columns
            .insert(table.into(), columns.into_iter().map(Into::into).collect());
        self
    }

    /// Drops a table from the expectations
    pub fn without_table(mut self, table: &str) -> Self {
        self.tables.columns.shift_remove(table);
        self
    }

    /// Sets the minimum view count of a schema, adding it if absent
    pub fn with_view_minimum(mut self, schema: &str, minimum: usize) -> Self {
        match self.views.iter_mut().find(|v| v.schema == schema) {
            Some(view) => view.minimum = minimum,
            None => self.views.push(ViewExpectation::new(schema, minimum)),
        }
        self
    }

    /// Changes how many data tables are sampled
    pub fn with_sample_limit(mut self, sample_limit: usize) -> Self {
        self.data.sample_limit = sample_limit;
        self
    }
}
