use std::path::PathBuf;

use cohort_model::{AnalysisKey, RegressionReport};
use cohort_output::ExportOutcome;

/// Counts for one `(dataset, reference group)` analysis unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSummary {
    pub key: AnalysisKey,
    pub subjects: usize,
    pub attempted: usize,
    pub fitted: usize,
    pub failed: usize,
    pub significant_outcomes: usize,
    pub significant_rows: usize,
    /// Configuration error that aborted this unit.
    pub error: Option<String>,
}

impl UnitSummary {
    pub fn from_report(key: AnalysisKey, subjects: usize, report: &RegressionReport) -> Self {
        Self {
            key,
            subjects,
            attempted: report.attempted,
            fitted: report.fitted_count(),
            failed: report.failures.len(),
            significant_outcomes: report.significant_outcomes().count(),
            significant_rows: report.significant_rows(),
            error: None,
        }
    }

    pub fn aborted(key: AnalysisKey, subjects: usize, error: String) -> Self {
        Self {
            key,
            subjects,
            attempted: 0,
            fitted: 0,
            failed: 0,
            significant_outcomes: 0,
            significant_rows: 0,
            error: Some(error),
        }
    }
}

#[derive(Debug)]
pub struct AnalysisRun {
    pub units: Vec<UnitSummary>,
    /// Reports of every unit that ran, in processing order.
    pub results: Vec<(AnalysisKey, RegressionReport)>,
    /// `None` on a dry run.
    pub export: Option<ExportOutcome>,
    pub output: PathBuf,
    pub errors: Vec<String>,
    pub has_errors: bool,
}

/// A discovered measurement table and its size at the configured timepoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetListing {
    pub name: String,
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
}
