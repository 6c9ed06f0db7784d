//! Regression engine: one analysis unit from table to significant coefficients.
//!
//! For every selected outcome the engine fits
//! `outcome ~ C(factor_1) + ... + C(group) + ...` over the rows that are
//! complete for that outcome, corrects the whole-model F-test p-values of all
//! fitted outcomes jointly with Benjamini-Hochberg, attaches the corrected
//! value to every coefficient row of its outcome, and keeps the rows below
//! alpha.

use std::collections::BTreeSet;

use polars::prelude::DataFrame;
use tracing::{debug, info, info_span, warn};

use cohort_common::{column_f64, column_strings, is_float_dtype, is_numeric_dtype};
use cohort_model::{
    FitFailure, OutcomeResult, OutcomeSelection, RegressionOptions, RegressionReport,
};

use crate::correction::benjamini_hochberg;
use crate::design::{FactorColumn, build_design};
use crate::error::{FitError, Result, StatsError};
use crate::ols::{OlsFit, fit_ols};

/// Result of fitting one outcome.
#[derive(Debug, Clone)]
pub struct OutcomeFit {
    pub outcome: String,
    pub result: std::result::Result<OlsFit, FitError>,
}

/// Runs the main-effects model for every selected outcome of `df`.
///
/// `reference_order` lists the group labels; its first entry is the reference
/// level of the group factor and must have rows in `df`. Later labels may be
/// absent.
pub fn run_regression(
    df: &DataFrame,
    reference_order: &[String],
    options: &RegressionOptions,
) -> Result<RegressionReport> {
    let reference_group = validate_reference_order(reference_order)?;
    let span = info_span!(
        "regression",
        reference_group = %reference_group,
        interactions = options.model.has_interactions()
    );
    let _guard = span.enter();

    validate_alpha(options.alpha)?;
    options.model.validate()?;

    let fits = fit_outcomes(df, reference_order, options)?;
    let attempted = fits.len();
    let report = correct_and_filter(reference_group, fits, options.alpha);
    info!(
        attempted,
        fitted = report.fitted_count(),
        failed = report.failures.len(),
        significant_rows = report.significant_rows(),
        "regression complete"
    );
    Ok(report)
}

/// Same as [`run_regression`] with a `covariate:group` interaction added.
///
/// `covariate` must already be a factor of the model.
pub fn run_regression_with_interaction(
    df: &DataFrame,
    reference_order: &[String],
    options: &RegressionOptions,
    covariate: &str,
) -> Result<RegressionReport> {
    let mut options = options.clone();
    let group = options.model.group_column.clone();
    let has_term = options
        .model
        .interactions
        .iter()
        .any(|(left, right)| left == covariate && *right == group);
    if !has_term {
        options.model = options.model.with_group_interaction(covariate);
    }
    run_regression(df, reference_order, &options)
}

/// Fits every selected outcome without correcting or filtering.
///
/// Configuration problems are returned as errors; per-outcome problems are
/// recorded in the matching [`OutcomeFit`].
pub fn fit_outcomes(
    df: &DataFrame,
    reference_order: &[String],
    options: &RegressionOptions,
) -> Result<Vec<OutcomeFit>> {
    let model = &options.model;
    if df.column(&model.group_column).is_err() {
        return Err(StatsError::MissingGroupColumn {
            column: model.group_column.clone(),
        });
    }

    let mut factors = Vec::with_capacity(model.factors.len());
    for name in &model.factors {
        let column = df.column(name).map_err(|_| StatsError::MissingColumn {
            column: name.clone(),
        })?;
        factors.push(FactorColumn {
            name: name.clone(),
            values: column_strings(column)?,
        });
    }

    let known: BTreeSet<&str> = reference_order.iter().map(String::as_str).collect();
    if let Some(group) = factors.iter().find(|factor| factor.name == model.group_column) {
        for label in group.values.iter().flatten() {
            if !known.contains(label.as_str()) {
                return Err(StatsError::UnknownGroupLabel {
                    label: label.clone(),
                });
            }
        }
        if let Some(reference) = reference_order.first()
            && !group.values.iter().flatten().any(|label| label == reference)
        {
            return Err(StatsError::ReferenceGroupMissing {
                label: reference.clone(),
            });
        }
    }

    let outcomes = select_outcomes(df, options)?;
    debug!(outcome_count = outcomes.len(), formula = %model.formula("<outcome>"), "selected outcomes");

    let mut fits = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        let column = df.column(&outcome)?;
        let response = column_f64(column)?;
        let result = fit_outcome(options, &factors, reference_order, &response);
        fits.push(OutcomeFit { outcome, result });
    }
    Ok(fits)
}

fn fit_outcome(
    options: &RegressionOptions,
    factors: &[FactorColumn],
    reference_order: &[String],
    response: &[Option<f64>],
) -> std::result::Result<OlsFit, FitError> {
    let rows: Vec<usize> = (0..response.len())
        .filter(|&row| {
            response[row].is_some() && factors.iter().all(|factor| factor.values[row].is_some())
        })
        .collect();
    let values: Vec<f64> = rows.iter().filter_map(|&row| response[row]).collect();
    let design = build_design(&options.model, factors, reference_order, &rows, values)?;
    fit_ols(&design)
}

/// Resolves the outcome columns in table order.
pub fn select_outcomes(df: &DataFrame, options: &RegressionOptions) -> Result<Vec<String>> {
    let model = &options.model;
    match &options.outcomes {
        OutcomeSelection::Declared { columns } => {
            for name in columns {
                let column = df.column(name).map_err(|_| StatsError::MissingColumn {
                    column: name.clone(),
                })?;
                if !is_numeric_dtype(column.dtype()) {
                    return Err(StatsError::NonNumericOutcome {
                        column: name.clone(),
                    });
                }
            }
            Ok(columns.clone())
        }
        OutcomeSelection::FloatColumns { exclude } => Ok(df
            .get_columns()
            .iter()
            .filter(|column| is_float_dtype(column.dtype()))
            .map(|column| column.name().to_string())
            .filter(|name| {
                *name != model.group_column
                    && !model.factors.contains(name)
                    && !exclude.contains(name)
            })
            .collect()),
    }
}

/// Corrects fitted outcomes jointly and filters their coefficient tables.
///
/// Failures are logged and left out of the correction, so the number of
/// corrected p-values always equals the number of fitted outcomes.
pub fn correct_and_filter(
    reference_group: &str,
    fits: Vec<OutcomeFit>,
    alpha: f64,
) -> RegressionReport {
    let attempted = fits.len();
    let mut fitted: Vec<(String, OlsFit)> = Vec::with_capacity(attempted);
    let mut failures = Vec::new();
    for fit in fits {
        match fit.result {
            Ok(model) => fitted.push((fit.outcome, model)),
            Err(error) => {
                warn!(outcome = %fit.outcome, reason = %error, "error fitting model");
                failures.push(FitFailure {
                    outcome: fit.outcome,
                    reason: error.to_string(),
                });
            }
        }
    }

    let p_values: Vec<f64> = fitted.iter().map(|(_, model)| model.f_pvalue).collect();
    let correction = benjamini_hochberg(&p_values, alpha);
    debug!(
        fitted = correction.len(),
        rejected = correction.reject.iter().filter(|rejected| **rejected).count(),
        "false discovery rate corrected"
    );

    let outcomes = fitted
        .into_iter()
        .zip(correction.corrected)
        .map(|((outcome, model), corrected_pvalue)| {
            let table = model
                .coefficient_table(corrected_pvalue)
                .filter_significant(alpha);
            debug!(
                outcome = %outcome,
                nobs = model.nobs,
                f_pvalue = model.f_pvalue,
                corrected_pvalue,
                significant_rows = table.len(),
                "outcome corrected"
            );
            OutcomeResult {
                outcome,
                nobs: model.nobs,
                f_pvalue: model.f_pvalue,
                corrected_pvalue,
                table,
            }
        })
        .collect();

    RegressionReport {
        reference_group: reference_group.to_string(),
        attempted,
        outcomes,
        failures,
    }
}

fn validate_reference_order(reference_order: &[String]) -> Result<&str> {
    let Some(first) = reference_order.first() else {
        return Err(StatsError::InvalidReferenceOrder {
            reason: "no group labels given".to_string(),
        });
    };
    let mut seen = BTreeSet::new();
    for label in reference_order {
        if !seen.insert(label.as_str()) {
            return Err(StatsError::InvalidReferenceOrder {
                reason: format!("label '{label}' is listed more than once"),
            });
        }
    }
    Ok(first)
}

fn validate_alpha(alpha: f64) -> Result<()> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(StatsError::InvalidAlpha { alpha })
    }
}
