//! Individual structural checks
//!
//! Each check runs one or two catalog queries against a read-only
//! `Catalog` and returns `Ok` when the artifact satisfies the expectation.
//! Failures carry the observed values so a report is self-explanatory.

use std::collections::BTreeSet;

use dbverify_core::{Catalog, QueryResult, Result, TableKind, VerifyError};

use crate::expectations::{MARKER_SCHEMA, MARKER_TABLE, PREVIEW_LIMIT};

/// Every name in `expected` must be a schema holding at least one table or
/// view. An empty schema counts as missing.
///
/// Missing names are reported sorted.
#[tracing::instrument(skip_all)]
pub fn check_schemas<I, S>(catalog: &dyn Catalog, expected: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let actual: BTreeSet<String> = catalog.list_schemas()?.into_iter().collect();
    let missing: Vec<String> = expected
        .into_iter()
        .map(|name| name.as_ref().to_string())
        .filter(|name| !actual.contains(name))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if !missing.is_empty() {
        return Err(VerifyError::MissingSchema { missing });
    }
    tracing::debug!(schemas = actual.len(), "all expected schemas present");
    Ok(())
}

/// The `main.plexos2duckdb` provenance table must exist
pub fn check_metadata_marker(catalog: &dyn Catalog) -> Result<()> {
    check_marker_table(catalog, MARKER_SCHEMA, MARKER_TABLE)
}

/// A marker table `schema.table` must exist
#[tracing::instrument(skip(catalog))]
pub fn check_marker_table(catalog: &dyn Catalog, schema: &str, table: &str) -> Result<()> {
    if !catalog.table_exists(schema, table)? {
        return Err(VerifyError::MissingMarker {
            schema: schema.to_string(),
            table: table.to_string(),
        });
    }
    Ok(())
}

/// `schema.table` must exist and contain every expected column.
///
/// Extra actual columns and column order are not checked.
#[tracing::instrument(skip(catalog, expected))]
pub fn check_table_columns<I, S>(
    catalog: &dyn Catalog,
    schema: &str,
    table: &str,
    expected: I,
) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if !catalog.table_exists(schema, table)? {
        return Err(VerifyError::MissingTable {
            schema: schema.to_string(),
            table: table.to_string(),
        });
    }

    let actual: Vec<String> = catalog
        .list_columns(schema, table)?
        .into_iter()
        .map(|c| c.name)
        .collect();

    for column in expected {
        let column = column.as_ref();
        if !actual.iter().any(|c| c == column) {
            return Err(VerifyError::MissingColumn {
                schema: schema.to_string(),
                table: table.to_string(),
                column: column.to_string(),
                actual,
            });
        }
    }
    Ok(())
}

/// `schema` must expose at least `minimum` views. Returns the count found.
#[tracing::instrument(skip(catalog))]
pub fn check_view_counts(catalog: &dyn Catalog, schema: &str, minimum: usize) -> Result<usize> {
    let found = catalog.list_tables(schema, Some(TableKind::View))?.len();
    if found < minimum {
        return Err(VerifyError::InsufficientViews {
            schema: schema.to_string(),
            minimum,
            found,
        });
    }
    Ok(found)
}

/// At least one of the first `sample_limit` base tables of `schema` must
/// hold rows. Returns the name of the first non-empty table.
///
/// Only a sample is counted, so sparse datasets pass while a total loss
/// of data does not.
#[tracing::instrument(skip(catalog))]
pub fn check_data_nonempty(
    catalog: &dyn Catalog,
    schema: &str,
    sample_limit: usize,
) -> Result<String> {
    let tables = catalog.list_tables(schema, Some(TableKind::BaseTable))?;
    if tables.is_empty() {
        return Err(VerifyError::NoDataTables {
            schema: schema.to_string(),
        });
    }

    let mut sampled = Vec::new();
    for table in tables.into_iter().take(sample_limit) {
        let rows = catalog.count_rows(schema, &table)?;
        if rows > 0 {
            tracing::debug!(table = %table, rows, "found non-empty data table");
            return Ok(table);
        }
        sampled.push(table);
    }

    Err(VerifyError::AllSampledTablesEmpty {
        schema: schema.to_string(),
        sampled,
    })
}

/// The first view of `schema` must answer a bounded `SELECT *`.
///
/// "First" is the lexicographically smallest view name, so the choice does
/// not depend on catalog ordering. The returned row set may be empty.
pub fn check_view_queryable(catalog: &dyn Catalog, schema: &str) -> Result<QueryResult> {
    check_view_queryable_with_limit(catalog, schema, PREVIEW_LIMIT)
}

/// Same as [`check_view_queryable`] with an explicit row limit
#[tracing::instrument(skip(catalog))]
pub fn check_view_queryable_with_limit(
    catalog: &dyn Catalog,
    schema: &str,
    limit: usize,
) -> Result<QueryResult> {
    let view = first_view(catalog, schema)?;
    let result = catalog.preview(schema, &view, limit).map_err(|e| {
        let detail = match e {
            VerifyError::Query(msg) => msg,
            other => other.to_string(),
        };
        VerifyError::Query(format!("SELECT from {}.{} failed: {}", schema, view, detail))
    })?;
    tracing::debug!(
        query_id = %result.id,
        duration_ms = result.execution_time_ms,
        view = %view,
        rows = result.row_count(),
        columns = result.column_count(),
        "view answered preview query"
    );
    Ok(result)
}

/// Name of the view `check_view_queryable` would probe
pub fn first_view(catalog: &dyn Catalog, schema: &str) -> Result<String> {
    catalog
        .list_tables(schema, Some(TableKind::View))?
        .into_iter()
        .min()
        .ok_or_else(|| VerifyError::NoViews {
            schema: schema.to_string(),
        })
}
