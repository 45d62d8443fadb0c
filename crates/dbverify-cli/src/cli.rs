//! dbverify - structural verifier for plexos2duckdb DuckDB artifacts
//!
//! Exit codes: 0 when every check passes, 1 when any check fails, 2 on
//! usage, profile or connection errors.

mod logging;
mod render;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use dbverify_checks::{Expectations, VerificationSuite, read_generator_metadata};
use dbverify_core::{Catalog, TableKind};
use dbverify_driver_duckdb::DuckDbConnection;

use crate::logging::{LogFormat, LoggingConfig};

const EXIT_FAILED: u8 = 1;
const EXIT_ERROR: u8 = 2;

/// Verify the schema of a plexos2duckdb artifact
#[derive(Parser, Debug)]
#[command(name = "dbverify")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Default log filter (trace, debug, info, warn, error); RUST_LOG wins
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every structural check against a database
    Check(CheckArgs),

    /// Show the generator metadata and schema overview of a database
    Inspect(InspectArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Arguments for the `check` subcommand.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Path to the DuckDB file
    #[arg(env = "DBVERIFY_DB_PATH")]
    pub database: PathBuf,

    /// TOML expectation profile replacing parts of the built-in one
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Stop at the first check that does not pass
    #[arg(long)]
    pub fail_fast: bool,
}

/// Arguments for the `inspect` subcommand.
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Path to the DuckDB file
    #[arg(env = "DBVERIFY_DB_PATH")]
    pub database: PathBuf,

    /// TOML expectation profile, used for the marker table location
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&LoggingConfig::new(&cli.log_level, cli.log_format)) {
        eprintln!("error: {:#}", e);
        return ExitCode::from(EXIT_ERROR);
    }

    let result = match &cli.command {
        Commands::Check(args) => run_check(args),
        Commands::Inspect(args) => run_inspect(args),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_FAILED),
        Err(e) => {
            tracing::error!(error = %e, "dbverify aborted");
            eprintln!("error: {:#}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn load_expectations(config: Option<&Path>) -> anyhow::Result<Expectations> {
    match config {
        Some(path) => Expectations::load(path)
            .with_context(|| format!("cannot load expectation profile {}", path.display())),
        None => Ok(Expectations::plexos()),
    }
}

fn open(database: &Path) -> anyhow::Result<DuckDbConnection> {
    DuckDbConnection::open_read_only(database)
        .with_context(|| format!("cannot open {}", database.display()))
}

/// Returns whether every check passed
fn run_check(args: &CheckArgs) -> anyhow::Result<bool> {
    let expectations = load_expectations(args.config.as_deref())?;
    let connection = open(&args.database)?;

    let report = VerificationSuite::new(&expectations)
        .fail_fast(args.fail_fast)
        .run(&connection)
        .with_database(args.database.display().to_string());

    match args.format {
        OutputFormat::Text => print!("{}", render::report_text(&report)),
        OutputFormat::Json => println!("{}", render::report_json(&report)?),
    }
    Ok(report.is_success())
}

fn run_inspect(args: &InspectArgs) -> anyhow::Result<bool> {
    let expectations = load_expectations(args.config.as_deref())?;
    let connection = open(&args.database)?;

    println!("Database: {}", args.database.display());
    println!("Engine:   {}", connection.engine_version()?);

    let mut overview = Vec::new();
    for schema in connection.list_schemas()? {
        let tables = connection
            .list_tables(&schema, Some(TableKind::BaseTable))?
            .len();
        let views = connection.list_tables(&schema, Some(TableKind::View))?.len();
        overview.push((schema, tables, views));
    }
    print!("{}", render::schema_overview_text(&overview));

    let metadata = read_generator_metadata(&connection, &expectations.marker)
        .context("cannot read generator metadata")?;
    print!("{}", render::metadata_text(&metadata));
    Ok(true)
}
