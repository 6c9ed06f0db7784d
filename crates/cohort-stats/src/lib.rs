//! Per-outcome OLS regression with Benjamini-Hochberg correction.
//!
//! # Modules
//!
//! - **design**: treatment-coded design matrices for categorical factors
//! - **ols**: least-squares fit with t and F inference
//! - **correction**: Benjamini-Hochberg FDR correction
//! - **engine**: the per-analysis-unit regression engine
//!
//! # Example
//!
//! ```ignore
//! use cohort_model::RegressionOptions;
//! use cohort_stats::run_regression;
//!
//! let order = vec!["control".to_string(), "case".to_string()];
//! let report = run_regression(&df, &order, &RegressionOptions::default())?;
//! for outcome in report.significant_outcomes() {
//!     println!("{}: {} rows", outcome.outcome, outcome.table.len());
//! }
//! ```

pub mod correction;
pub mod design;
pub mod engine;
pub mod error;
pub mod ols;

pub use correction::{FdrCorrection, benjamini_hochberg};
pub use design::{DesignMatrix, EncodedFactor, FactorColumn, INTERCEPT, build_design, sort_levels};
pub use engine::{
    OutcomeFit, correct_and_filter, fit_outcomes, run_regression, run_regression_with_interaction,
    select_outcomes,
};
pub use error::{FitError, Result, StatsError};
pub use ols::{OlsFit, fit_ols};
