//! Suite runner
//!
//! Expands an [`Expectations`] profile into independent checks, runs each
//! one against a catalog and collects the outcomes into a [`SuiteReport`].
//! A failing check never stops the others unless fail-fast is requested.

use std::time::Instant;

use chrono::{DateTime, Utc};
use dbverify_core::{Catalog, VerifyError};
use serde::Serialize;

use crate::checks::{
    check_data_nonempty, check_marker_table, check_schemas, check_table_columns,
    check_view_counts, check_view_queryable_with_limit,
};
use crate::expectations::{Expectations, ViewExpectation};

/// Result of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Passed,
    /// The artifact does not have the expected shape
    Failed,
    /// The check could not be evaluated
    Errored,
    /// Not run because an earlier check failed in fail-fast mode
    Skipped,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Passed => "passed",
            CheckStatus::Failed => "failed",
            CheckStatus::Errored => "errored",
            CheckStatus::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub name: String,
    pub status: CheckStatus,
    /// `VerifyError::kind` of the failure, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    pub message: String,
    pub duration_ms: u64,
}

impl CheckOutcome {
    fn from_result(name: String, result: Result<String, VerifyError>, duration_ms: u64) -> Self {
        match result {
            Ok(message) => Self {
                name,
                status: CheckStatus::Passed,
                error_kind: None,
                message,
                duration_ms,
            },
            Err(err) => Self {
                name,
                status: if err.is_assertion() {
                    CheckStatus::Failed
                } else {
                    CheckStatus::Errored
                },
                error_kind: Some(err.kind().to_string()),
                message: err.to_string(),
                duration_ms,
            },
        }
    }

    fn skipped(name: String) -> Self {
        Self {
            name,
            status: CheckStatus::Skipped,
            error_kind: None,
            message: "skipped after an earlier failure".to_string(),
            duration_ms: 0,
        }
    }

    pub fn is_passed(&self) -> bool {
        self.status == CheckStatus::Passed
    }
}

/// Outcomes of one suite run, in execution order
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    pub driver: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub outcomes: Vec<CheckOutcome>,
}

impl SuiteReport {
    /// Label the report with the verified database
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn passed(&self) -> usize {
        self.count(CheckStatus::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(CheckStatus::Failed)
    }

    pub fn errored(&self) -> usize {
        self.count(CheckStatus::Errored)
    }

    pub fn skipped(&self) -> usize {
        self.count(CheckStatus::Skipped)
    }

    /// True when every check ran and passed
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(CheckOutcome::is_passed)
    }

    pub fn outcome(&self, name: &str) -> Option<&CheckOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    /// Outcomes that did not pass, skipped ones excluded
    pub fn problems(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, CheckStatus::Failed | CheckStatus::Errored))
    }

    fn count(&self, status: CheckStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}

enum Check<'a> {
    Schemas,
    Marker,
    TableColumns { table: &'a str, columns: &'a [String] },
    ViewCount(&'a ViewExpectation),
    DataNonEmpty,
    ViewQueryable,
}

/// Runs every check an [`Expectations`] profile describes
pub struct VerificationSuite<'a> {
    expectations: &'a Expectations,
    fail_fast: bool,
}

impl<'a> VerificationSuite<'a> {
    pub fn new(expectations: &'a Expectations) -> Self {
        Self {
            expectations,
            fail_fast: false,
        }
    }

    /// Skip the remaining checks after the first one that does not pass
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Check names in execution order
    pub fn check_names(&self) -> Vec<String> {
        self.plan().iter().map(|check| self.name_of(check)).collect()
    }

    #[tracing::instrument(skip_all, fields(driver = catalog.driver_name()))]
    pub fn run(&self, catalog: &dyn Catalog) -> SuiteReport {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut outcomes = Vec::new();
        let mut stopped = false;

        for check in self.plan() {
            let name = self.name_of(&check);
            if stopped {
                outcomes.push(CheckOutcome::skipped(name));
                continue;
            }

            let check_start = Instant::now();
            let result = self.evaluate(catalog, &check);
            let duration_ms = check_start.elapsed().as_millis() as u64;
            let outcome = CheckOutcome::from_result(name, result, duration_ms);

            match outcome.status {
                CheckStatus::Passed => {
                    tracing::debug!(check = %outcome.name, duration_ms, "check passed")
                }
                CheckStatus::Failed => tracing::warn!(
                    check = %outcome.name,
                    kind = outcome.error_kind.as_deref().unwrap_or_default(),
                    "check failed: {}",
                    outcome.message
                ),
                _ => tracing::error!(
                    check = %outcome.name,
                    "check could not be evaluated: {}",
                    outcome.message
                ),
            }

            stopped = self.fail_fast && !outcome.is_passed();
            outcomes.push(outcome);
        }

        let report = SuiteReport {
            database: None,
            driver: catalog.driver_name().to_string(),
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
            outcomes,
        };
        tracing::info!(
            passed = report.passed(),
            failed = report.failed(),
            errored = report.errored(),
            skipped = report.skipped(),
            duration_ms = report.duration_ms,
            "verification finished"
        );
        report
    }

    fn plan(&self) -> Vec<Check<'a>> {
        let expectations = self.expectations;
        let mut plan = vec![Check::Schemas, Check::Marker];
        plan.extend(
            expectations
                .tables
                .columns
                .iter()
                .map(|(table, columns)| Check::TableColumns {
                    table: table.as_str(),
                    columns: columns.as_slice(),
                }),
        );
        plan.extend(expectations.views.iter().map(Check::ViewCount));
        plan.push(Check::DataNonEmpty);
        plan.push(Check::ViewQueryable);
        plan
    }

    fn name_of(&self, check: &Check<'_>) -> String {
        let e = self.expectations;
        match check {
            Check::Schemas => "schemas".to_string(),
            Check::Marker => "metadata_marker".to_string(),
            Check::TableColumns { table, .. } => {
                format!("table_columns[{}.{}]", e.tables.schema, table)
            }
            Check::ViewCount(view) => format!("view_count[{}]", view.schema),
            Check::DataNonEmpty => format!("data_non_empty[{}]", e.data.schema),
            Check::ViewQueryable => format!("view_queryable[{}]", e.preview.schema),
        }
    }

    fn evaluate(&self, catalog: &dyn Catalog, check: &Check<'_>) -> Result<String, VerifyError> {
        let e = self.expectations;
        match check {
            Check::Schemas => {
                check_schemas(catalog, &e.schemas)?;
                Ok(format!("{} schemas present", e.schemas.len()))
            }
            Check::Marker => {
                check_marker_table(catalog, &e.marker.schema, &e.marker.table)?;
                Ok(format!("{}.{} present", e.marker.schema, e.marker.table))
            }
            Check::TableColumns { table, columns } => {
                check_table_columns(catalog, &e.tables.schema, table, columns.iter())?;
                Ok(format!("{} required columns present", columns.len()))
            }
            Check::ViewCount(view) => {
                let found = check_view_counts(catalog, &view.schema, view.minimum)?;
                Ok(format!("{} views (minimum {})", found, view.minimum))
            }
            Check::DataNonEmpty => {
                let table = check_data_nonempty(catalog, &e.data.schema, e.data.sample_limit)?;
                Ok(format!("{}.{} has rows", e.data.schema, table))
            }
            Check::ViewQueryable => {
                let result =
                    check_view_queryable_with_limit(catalog, &e.preview.schema, e.preview.limit)?;
                Ok(format!(
                    "returned {} rows, {} columns",
                    result.row_count(),
                    result.column_count()
                ))
            }
        }
    }
}
