//! Flattening of significant coefficient tables into one CSV file.

use std::fs;
use std::path::{Path, PathBuf};

use cohort_model::{AnalysisKey, COEFFICIENT_COLUMNS, CoefficientRow, RegressionReport};

use crate::error::{OutputError, Result};

/// Identifying columns appended after the coefficient columns.
pub const DATASET_COLUMN: &str = "Dataset";
pub const REFERENCE_GROUP_COLUMN: &str = "Reference Group";
pub const DEPENDENT_VARIABLE_COLUMN: &str = "Dependent Variable";
pub const INDEPENDENT_VARIABLE_COLUMN: &str = "Independent Variable";

/// What the exporter did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The file was written with this many coefficient rows.
    Written { path: PathBuf, rows: usize },
    /// No coefficient passed the threshold anywhere; no file was written.
    NothingSignificant,
}

/// One flattened output row.
#[derive(Debug, Clone, Copy)]
pub struct ExportRow<'a> {
    pub key: &'a AnalysisKey,
    pub outcome: &'a str,
    pub coefficient: &'a CoefficientRow,
}

/// Header of the results file, in column order.
pub fn export_header() -> Vec<&'static str> {
    let mut header = COEFFICIENT_COLUMNS.to_vec();
    header.extend([
        DATASET_COLUMN,
        REFERENCE_GROUP_COLUMN,
        DEPENDENT_VARIABLE_COLUMN,
        INDEPENDENT_VARIABLE_COLUMN,
    ]);
    header
}

/// Rows of every non-empty coefficient table, in input order.
pub fn flatten_results(results: &[(AnalysisKey, RegressionReport)]) -> Vec<ExportRow<'_>> {
    results
        .iter()
        .flat_map(|(key, report)| {
            report.significant_outcomes().flat_map(move |outcome| {
                outcome.table.rows.iter().map(move |coefficient| ExportRow {
                    key,
                    outcome: outcome.outcome.as_str(),
                    coefficient,
                })
            })
        })
        .collect()
}

/// Writes all significant coefficients to `path`.
///
/// When nothing is significant no file is created. A file already at `path`
/// is left untouched and reported with a warning.
pub fn export_significant_results(
    results: &[(AnalysisKey, RegressionReport)],
    path: &Path,
) -> Result<ExportOutcome> {
    let rows = flatten_results(results);
    if rows.is_empty() {
        tracing::info!(units = results.len(), "no significant p-values found");
        if path.exists() {
            tracing::warn!(
                path = %path.display(),
                "results file from an earlier run was kept; it does not reflect this run"
            );
        }
        return Ok(ExportOutcome::NothingSignificant);
    }

    ensure_parent_dir(path)?;
    let csv_error = |source: csv::Error| OutputError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    writer.write_record(export_header()).map_err(csv_error)?;
    for row in &rows {
        let mut record: Vec<String> = row
            .coefficient
            .values()
            .iter()
            .map(|value| format_float(*value))
            .collect();
        record.push(row.key.dataset.clone());
        record.push(row.key.reference_group.clone());
        record.push(row.outcome.to_string());
        record.push(row.coefficient.term.clone());
        writer.write_record(&record).map_err(csv_error)?;
    }
    writer.flush().map_err(|source| OutputError::Flush {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(path = %path.display(), rows = rows.len(), "exported significant coefficients");
    Ok(ExportOutcome::Written {
        path: path.to_path_buf(),
        rows: rows.len(),
    })
}

/// Shortest round-trip representation; NaN is written as an empty field.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{value:?}")
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| OutputError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}
