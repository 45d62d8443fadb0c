//! dbverify core - shared abstractions for read-only artifact verification
//!
//! This crate provides the types every other dbverify crate depends on:
//!
//! - `Catalog` - read-only view of a database catalog (schemas, tables, columns)
//! - `VerifyError` - the failure taxonomy surfaced to the check runner
//! - Common types like `Value`, `Row`, `QueryResult` and `ColumnInfo`

mod catalog;
mod error;
mod types;

pub use catalog::*;
pub use error::*;
pub use types::*;
