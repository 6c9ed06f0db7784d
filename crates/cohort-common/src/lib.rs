//! Shared utilities for cohort analysis crates.
//!
//! This crate provides common utilities used across the workspace,
//! including Polars DataFrame helpers.

pub mod polars;

// Re-export commonly used functions at crate root for convenience
pub use polars::{
    any_to_i64, column_f64, column_strings, is_float_dtype, is_numeric_dtype, parse_f64,
    parse_i64,
};
