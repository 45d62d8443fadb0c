//! Core types for dbverify

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A database value read back from the artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit floating point
    Float64(f64),
    /// UTF-8 string
    String(String),
    /// Binary data
    Bytes(Vec<u8>),
}

impl Value {
    /// Check if the value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            Value::Bool(v) => Some(i64::from(*v)),
            Value::String(s) => s.parse::<i64>().ok(),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

/// A row from a query result
#[derive(Debug, Clone)]
pub struct Row {
    /// Column values
    pub values: Vec<Value>,
    columns: Vec<String>,
}

impl Row {
    /// Create a new row
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { values, columns }
    }

    /// Get a value by column index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value by column name
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|idx| self.values.get(idx))
    }
}

/// Result-set column metadata
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ColumnMeta {
    pub name: String,
    /// Column ordinal position (0-based)
    pub ordinal: usize,
}

/// Row set returned by a query
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// Unique query ID
    pub id: Uuid,
    /// Column metadata
    pub columns: Vec<ColumnMeta>,
    /// Result rows
    pub rows: Vec<Row>,
    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl QueryResult {
    /// Create a new empty query result
    pub fn empty() -> Self {
        Self {
            id: Uuid::new_v4(),
            columns: Vec::new(),
            rows: Vec::new(),
            execution_time_ms: 0,
        }
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Column names in result order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// First value of the first row, for scalar queries
    pub fn scalar(&self) -> Option<&Value> {
        self.rows.first().and_then(|row| row.get(0))
    }
}

/// Column information as reported by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ColumnInfo {
    pub name: String,
    /// Physical position, 1-based as in `information_schema.columns`
    pub ordinal: usize,
    pub data_type: String,
    pub nullable: bool,
}

/// Kind of catalog entity stored under a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableKind {
    /// A physically stored table
    BaseTable,
    /// A stored query definition
    View,
}

impl TableKind {
    /// The `table_type` value used by `information_schema.tables`
    pub fn information_schema_type(&self) -> &'static str {
        match self {
            TableKind::BaseTable => "BASE TABLE",
            TableKind::View => "VIEW",
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableKind::BaseTable => write!(f, "table"),
            TableKind::View => write!(f, "view"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::from("abc").as_str(), Some("abc"));
        assert_eq!(Value::from(42).as_i64(), Some(42));
        assert_eq!(Value::String("7".into()).as_i64(), Some(7));
        assert_eq!(Value::Bool(true).as_i64(), Some(1));
        assert!(Value::Null.is_null());
        assert_eq!(Value::Null.as_str(), None);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Bytes(vec![1, 2, 3]).to_string(), "<3 bytes>");
        assert_eq!(Value::Float64(1.5).to_string(), "1.5");
    }

    #[test]
    fn test_row_lookup_by_name() {
        let row = Row::new(
            vec!["key".into(), "value".into()],
            vec![Value::from("model_name"), Value::from("DAY_AHEAD")],
        );
        assert_eq!(row.get_by_name("value"), Some(&Value::from("DAY_AHEAD")));
        assert_eq!(row.get_by_name("missing"), None);
    }

    #[test]
    fn test_query_result_scalar() {
        let mut result = QueryResult::empty();
        assert!(result.scalar().is_none());
        result.columns.push(ColumnMeta {
            name: "count".into(),
            ordinal: 0,
        });
        result
            .rows
            .push(Row::new(vec!["count".into()], vec![Value::Int64(3)]));
        assert_eq!(result.scalar(), Some(&Value::Int64(3)));
        assert_eq!(result.column_names(), vec!["count"]);
        assert_eq!(result.row_count(), 1);
    }
}
