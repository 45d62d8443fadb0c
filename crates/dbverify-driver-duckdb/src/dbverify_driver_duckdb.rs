//! DuckDB driver for dbverify
//!
//! DuckDB is an in-process analytical database management system. This
//! driver only ever opens database files in read-only access mode and
//! exposes their catalog through the `Catalog` trait.

mod driver;
#[cfg(test)]
mod driver_tests;
mod schema;

pub use driver::*;
