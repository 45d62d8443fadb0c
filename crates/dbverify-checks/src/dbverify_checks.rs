//! dbverify checks - structural verification of converter artifacts
//!
//! This crate provides:
//! - Built-in and TOML-loaded expectation profiles
//! - The individual schema, table, view and data checks
//! - A suite runner that evaluates every check independently and reports
//! - A reader for the generator metadata stored in the marker table

pub mod checks;
pub mod expectations;
pub mod metadata;
pub mod suite;

#[cfg(test)]
mod checks_tests;
#[cfg(test)]
mod suite_tests;
#[cfg(test)]
mod test_support;

pub use checks::*;
pub use expectations::*;
pub use metadata::*;
pub use suite::*;
