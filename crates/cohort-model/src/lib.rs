//! Data model for cohort-comparison regression analyses.

pub mod coefficient;
pub mod error;
pub mod report;
pub mod spec;

pub use coefficient::{
    CI_LOWER_COLUMN, CI_UPPER_COLUMN, COEF_COLUMN, COEFFICIENT_COLUMNS, CoefficientRow,
    CoefficientTable, P_COLUMN, P_CORRECTED_COLUMN, STD_ERR_COLUMN, T_COLUMN,
};
pub use error::{ModelError, Result};
pub use report::{AnalysisKey, FitFailure, OutcomeResult, RegressionReport};
pub use spec::{
    DEFAULT_ALPHA, DEFAULT_COVARIATES, DEFAULT_INTERACTION_COVARIATE, GROUP_COLUMN, ModelSpec,
    OutcomeSelection, RegressionOptions,
};
