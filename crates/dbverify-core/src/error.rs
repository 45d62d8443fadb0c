//! Error types for dbverify

use thiserror::Error;

/// Core error type for verification runs
///
/// The first group of variants are assertion failures: the artifact was
/// readable but does not have the expected shape. The remaining variants
/// report that a check could not be evaluated at all.
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Missing schemas: {missing:?}")]
    MissingSchema { missing: Vec<String> },

    #[error("Missing {schema}.{table}")]
    MissingMarker { schema: String, table: String },

    #[error("Missing {schema}.{table}")]
    MissingTable { schema: String, table: String },

    #[error("{schema}.{table} missing column {column} (actual: {actual:?})")]
    MissingColumn {
        schema: String,
        table: String,
        column: String,
        actual: Vec<String>,
    },

    #[error("Expected at least {minimum} {schema}.* views, found {found}")]
    InsufficientViews {
        schema: String,
        minimum: usize,
        found: usize,
    },

    #[error("No {schema}.* tables found")]
    NoDataTables { schema: String },

    #[error("All sampled {schema}.* tables were empty (sampled: {sampled:?})")]
    AllSampledTablesEmpty { schema: String, sampled: Vec<String> },

    #[error("No {schema} views found")]
    NoViews { schema: String },

    #[error("Query error: {0}")]
    Query(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VerifyError {
    /// Stable name of the failure kind, used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            VerifyError::Connection(_) => "ConnectionError",
            VerifyError::MissingSchema { .. } => "MissingSchemaError",
            VerifyError::MissingMarker { .. } => "MissingMarkerError",
            VerifyError::MissingTable { .. } => "MissingTableError",
            VerifyError::MissingColumn { .. } => "MissingColumnError",
            VerifyError::InsufficientViews { .. } => "InsufficientViewsError",
            VerifyError::NoDataTables { .. } => "NoDataTablesError",
            VerifyError::AllSampledTablesEmpty { .. } => "AllSampledTablesEmptyError",
            VerifyError::NoViews { .. } => "NoViewsError",
            VerifyError::Query(_) => "QueryError",
            VerifyError::Driver(_) => "DriverError",
            VerifyError::Configuration(_) => "ConfigurationError",
            VerifyError::Io(_) => "IoError",
        }
    }

    /// Whether this error is a shape assertion rather than an evaluation failure
    pub fn is_assertion(&self) -> bool {
        !matches!(
            self,
            VerifyError::Connection(_)
                | VerifyError::Query(_)
                | VerifyError::Driver(_)
                | VerifyError::Configuration(_)
                | VerifyError::Io(_)
        )
    }
}

/// Result type alias for verification operations
pub type Result<T> = std::result::Result<T, VerifyError>;
