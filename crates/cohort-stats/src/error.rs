//! Error types for the regression engine.

use thiserror::Error;

use cohort_model::ModelError;

/// Configuration errors. These abort the whole analysis unit.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("'{column}' column is not in the dataframe")]
    MissingGroupColumn { column: String },

    #[error("column '{column}' not found in the dataframe")]
    MissingColumn { column: String },

    #[error("outcome column '{column}' is not numeric")]
    NonNumericOutcome { column: String },

    #[error("invalid reference group order: {reason}")]
    InvalidReferenceOrder { reason: String },

    #[error("group label '{label}' is present in the data but missing from the reference order")]
    UnknownGroupLabel { label: String },

    #[error("reference group '{label}' has no rows in the data")]
    ReferenceGroupMissing { label: String },

    #[error("alpha must be within (0, 1), got {alpha}")]
    InvalidAlpha { alpha: f64 },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for StatsError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for regression engine operations.
pub type Result<T> = std::result::Result<T, StatsError>;

/// Reasons a single outcome model could not be fitted.
///
/// These are recovered locally: the outcome is skipped and reported.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("no complete observations")]
    NoObservations,

    #[error("{nobs} observations leave no residual degrees of freedom for rank {rank}")]
    InsufficientObservations { nobs: usize, rank: usize },

    #[error("outcome is constant across all observations")]
    ConstantOutcome,

    #[error("residual variance is zero")]
    PerfectFit,

    #[error("reference group '{group}' has no complete observations")]
    ReferenceGroupAbsent { group: String },

    #[error("design has no predictors beyond the intercept")]
    NoPredictors,

    #[error("decomposition failed: {0}")]
    Decomposition(String),

    #[error("distribution error: {0}")]
    Distribution(String),

    #[error("non-finite {statistic}")]
    NonFiniteStatistic { statistic: &'static str },
}
