//! In-memory catalog double for unit tests

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use dbverify_core::{
    Catalog, ColumnInfo, ColumnMeta, QueryResult, Result, Row, TableKind, Value, VerifyError,
};

struct FakeTable {
    schema: String,
    name: String,
    kind: TableKind,
    columns: Vec<String>,
    rows: u64,
}

/// Catalog built from literal tables. Listings keep insertion order.
#[derive(Default)]
pub(crate) struct FakeCatalog {
    schemas: BTreeSet<String>,
    tables: Vec<FakeTable>,
    queries: HashMap<String, QueryResult>,
    broken: HashSet<(String, String)>,
    counted: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, schema: &str) -> Self {
        self.schemas.insert(schema.to_string());
        self
    }

    pub fn with_table(self, schema: &str, name: &str, columns: &[&str], rows: u64) -> Self {
        self.with_entity(schema, name, TableKind::BaseTable, columns, rows)
    }

    pub fn with_view(self, schema: &str, name: &str, columns: &[&str], rows: u64) -> Self {
        self.with_entity(schema, name, TableKind::View, columns, rows)
    }

    /// A view whose preview query fails
    pub fn with_broken_view(mut self, schema: &str, name: &str) -> Self {
        self.broken.insert((schema.to_string(), name.to_string()));
        self.with_view(schema, name, &["value"], 0)
    }

    pub fn with_rows(mut self, sql: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        self.queries.insert(sql.to_string(), result_of(columns, rows));
        self
    }

    /// How many times `count_rows` was called
    pub fn counted(&self) -> usize {
        self.counted.load(Ordering::SeqCst)
    }

    fn with_entity(
        mut self,
        schema: &str,
        name: &str,
        kind: TableKind,
        columns: &[&str],
        rows: u64,
    ) -> Self {
        self.schemas.insert(schema.to_string());
        self.tables.push(FakeTable {
            schema: schema.to_string(),
            name: name.to_string(),
            kind,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        });
        self
    }

    fn find(&self, schema: &str, name: &str) -> Option<&FakeTable> {
        self.tables
            .iter()
            .find(|t| t.schema == schema && t.name == name)
    }
}

fn result_of(columns: &[&str], rows: Vec<Vec<Value>>) -> QueryResult {
    let names: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
    let mut result = QueryResult::empty();
    result.columns = names
        .iter()
        .enumerate()
        .map(|(ordinal, name)| ColumnMeta {
            name: name.clone(),
            ordinal,
        })
        .collect();
    result.rows = rows
        .into_iter()
        .map(|values| Row::new(names.clone(), values))
        .collect();
    result
}

impl Catalog for FakeCatalog {
    fn driver_name(&self) -> &str {
        "fake"
    }

    fn query(&self, sql: &str, _params: &[Value]) -> Result<QueryResult> {
        self.queries
            .get(sql)
            .cloned()
            .ok_or_else(|| VerifyError::Query(format!("unexpected query: {}", sql)))
    }

    fn list_schemas(&self) -> Result<Vec<String>> {
        Ok(self.schemas.iter().cloned().collect())
    }

    fn list_tables(&self, schema: &str, kind: Option<TableKind>) -> Result<Vec<String>> {
        Ok(self
            .tables
            .iter()
            .filter(|t| t.schema == schema && kind.is_none_or(|k| k == t.kind))
            .map(|t| t.name.clone())
            .collect())
    }

    fn list_columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnInfo>> {
        Ok(self
            .find(schema, table)
            .map(|t| {
                t.columns
                    .iter()
                    .enumerate()
                    .map(|(idx, name)| ColumnInfo {
                        name: name.clone(),
                        ordinal: idx + 1,
                        data_type: "VARCHAR".to_string(),
                        nullable: true,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn count_rows(&self, schema: &str, table: &str) -> Result<u64> {
        self.counted.fetch_add(1, Ordering::SeqCst);
        self.find(schema, table)
            .map(|t| t.rows)
            .ok_or_else(|| VerifyError::Query(format!("no table {}.{}", schema, table)))
    }

    fn preview(&self, schema: &str, table: &str, limit: usize) -> Result<QueryResult> {
        if self.broken.contains(&(schema.to_string(), table.to_string())) {
            return Err(VerifyError::Query(format!(
                "Binder Error: referenced table of {}.{} is gone",
                schema, table
            )));
        }
        let t = self
            .find(schema, table)
            .ok_or_else(|| VerifyError::Query(format!("no table {}.{}", schema, table)))?;
        let columns: Vec<&str> = t.columns.iter().map(String::as_str).collect();
        let shown = (t.rows as usize).min(limit);
        let rows = (0..shown)
            .map(|_| vec![Value::Null; columns.len()])
            .collect();
        Ok(result_of(&columns, rows))
    }
}
