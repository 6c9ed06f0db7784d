//! Outcome-level results of one analysis unit.

use std::fmt;

use serde::Serialize;

use crate::coefficient::CoefficientTable;

/// Identifies one analysis unit: a dataset analysed against one reference group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AnalysisKey {
    pub dataset: String,
    pub reference_group: String,
}

impl AnalysisKey {
    pub fn new(dataset: impl Into<String>, reference_group: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            reference_group: reference_group.into(),
        }
    }
}

impl fmt::Display for AnalysisKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (ref: {})", self.dataset, self.reference_group)
    }
}

/// A successfully fitted outcome with its significant coefficients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeResult {
    pub outcome: String,
    /// Observations used after listwise deletion.
    pub nobs: usize,
    /// Whole-model F-test p-value before correction.
    pub f_pvalue: f64,
    pub corrected_pvalue: f64,
    /// Rows with a corrected p-value below alpha; may be empty.
    pub table: CoefficientTable,
}

impl OutcomeResult {
    pub fn is_significant(&self) -> bool {
        !self.table.is_empty()
    }
}

/// An outcome that could not be fitted and was left out of the correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FitFailure {
    pub outcome: String,
    pub reason: String,
}

/// Batch result of one regression engine call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegressionReport {
    pub reference_group: String,
    /// Number of outcomes a fit was attempted for.
    pub attempted: usize,
    /// Fitted outcomes in table column order.
    pub outcomes: Vec<OutcomeResult>,
    pub failures: Vec<FitFailure>,
}

impl RegressionReport {
    pub fn fitted_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn get(&self, outcome: &str) -> Option<&OutcomeResult> {
        self.outcomes.iter().find(|result| result.outcome == outcome)
    }

    pub fn significant_outcomes(&self) -> impl Iterator<Item = &OutcomeResult> {
        self.outcomes.iter().filter(|result| result.is_significant())
    }

    /// Total coefficient rows surviving the filter across all outcomes.
    pub fn significant_rows(&self) -> usize {
        self.outcomes.iter().map(|result| result.table.len()).sum()
    }

    pub fn outcome_names(&self) -> impl Iterator<Item = &str> {
        self.outcomes.iter().map(|result| result.outcome.as_str())
    }
}
