//! Treatment-coded design matrices for categorical factor models.
//!
//! Every factor is dummy-coded against its first level. Non-group factors sort
//! their levels (numerically when every level is a number), while the group
//! factor takes its level order from the caller-supplied reference order. Term
//! names follow the usual formula convention:
//!
//! - `Intercept`
//! - `C(factor)[T.level]` for main effects
//! - `C(left)[T.x]:C(right)[T.y]` for interactions

use std::cmp::Ordering;
use std::collections::BTreeSet;

use nalgebra::{DMatrix, DVector};

use cohort_common::parse_f64;
use cohort_model::ModelSpec;

use crate::error::FitError;

pub const INTERCEPT: &str = "Intercept";

/// Raw values of one factor column, aligned with the table rows.
#[derive(Debug, Clone)]
pub struct FactorColumn {
    pub name: String,
    pub values: Vec<Option<String>>,
}

/// A factor restricted to the rows used in a fit.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFactor {
    pub name: String,
    /// Levels in coding order; the first is the reference level.
    pub levels: Vec<String>,
    /// Level index of every used row.
    codes: Vec<usize>,
}

impl EncodedFactor {
    /// Encodes `values[rows]` with levels in sorted order.
    pub fn sorted(name: &str, values: &[Option<String>], rows: &[usize]) -> Self {
        let distinct: BTreeSet<&str> = rows
            .iter()
            .filter_map(|&row| values[row].as_deref())
            .collect();
        let mut levels: Vec<String> = distinct.into_iter().map(str::to_string).collect();
        sort_levels(&mut levels);
        Self::with_levels(name, levels, values, rows)
    }

    /// Encodes `values[rows]` with levels taken from `order`, keeping only
    /// levels that occur in the used rows.
    ///
    /// Every used value must appear in `order`; callers check this first.
    pub fn ordered(name: &str, order: &[String], values: &[Option<String>], rows: &[usize]) -> Self {
        let present: BTreeSet<&str> = rows
            .iter()
            .filter_map(|&row| values[row].as_deref())
            .collect();
        let levels: Vec<String> = order
            .iter()
            .filter(|label| present.contains(label.as_str()))
            .cloned()
            .collect();
        Self::with_levels(name, levels, values, rows)
    }

    fn with_levels(name: &str, levels: Vec<String>, values: &[Option<String>], rows: &[usize]) -> Self {
        let codes = rows
            .iter()
            .map(|&row| {
                values[row]
                    .as_deref()
                    .and_then(|value| levels.iter().position(|level| level == value))
                    .unwrap_or(0)
            })
            .collect();
        Self {
            name: name.to_string(),
            levels,
            codes,
        }
    }

    pub fn reference_level(&self) -> Option<&str> {
        self.levels.first().map(String::as_str)
    }

    /// Number of dummy columns this factor contributes.
    pub fn dummy_count(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    fn dummy_name(&self, level_index: usize) -> String {
        format!("C({})[T.{}]", self.name, self.levels[level_index])
    }

    fn indicator(&self, row: usize, level_index: usize) -> f64 {
        if self.codes[row] == level_index { 1.0 } else { 0.0 }
    }
}

/// Orders levels numerically when all of them parse as numbers, otherwise
/// lexicographically.
pub fn sort_levels(levels: &mut [String]) {
    if levels.iter().all(|level| parse_f64(level).is_some()) {
        levels.sort_by(|a, b| compare_numeric_levels(a, b).then_with(|| a.cmp(b)));
    } else {
        levels.sort();
    }
}

/// Regressors and response of one outcome model.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    pub terms: Vec<String>,
    pub x: DMatrix<f64>,
    pub y: DVector<f64>,
}

impl DesignMatrix {
    pub fn nobs(&self) -> usize {
        self.x.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.x.ncols()
    }
}

/// Builds the design matrix of `spec` over the used `rows`.
///
/// `factors` must hold one column per entry of `spec.factors`, in the same
/// order. `response` holds the outcome value of every used row.
///
/// The first label of `group_order` must occur in the used rows, otherwise
/// the group coefficients would be measured against another level.
pub fn build_design(
    spec: &ModelSpec,
    factors: &[FactorColumn],
    group_order: &[String],
    rows: &[usize],
    response: Vec<f64>,
) -> Result<DesignMatrix, FitError> {
    let encoded: Vec<EncodedFactor> = factors
        .iter()
        .map(|column| {
            if column.name == spec.group_column {
                EncodedFactor::ordered(&column.name, group_order, &column.values, rows)
            } else {
                EncodedFactor::sorted(&column.name, &column.values, rows)
            }
        })
        .collect();

    if !rows.is_empty()
        && let (Some(expected), Some(group)) = (
            group_order.first(),
            encoded.iter().find(|factor| factor.name == spec.group_column),
        )
        && group.reference_level() != Some(expected.as_str())
    {
        return Err(FitError::ReferenceGroupAbsent {
            group: expected.clone(),
        });
    }

    let mut terms = vec![INTERCEPT.to_string()];
    let mut columns: Vec<Vec<f64>> = vec![vec![1.0; rows.len()]];

    for factor in &encoded {
        for level in 1..factor.levels.len() {
            terms.push(factor.dummy_name(level));
            columns.push((0..rows.len()).map(|row| factor.indicator(row, level)).collect());
        }
    }

    for (left_name, right_name) in &spec.interactions {
        let (Some(left), Some(right)) = (
            encoded.iter().find(|factor| &factor.name == left_name),
            encoded.iter().find(|factor| &factor.name == right_name),
        ) else {
            continue;
        };
        // Left factor varies fastest.
        for right_level in 1..right.levels.len() {
            for left_level in 1..left.levels.len() {
                terms.push(format!(
                    "{}:{}",
                    left.dummy_name(left_level),
                    right.dummy_name(right_level)
                ));
                columns.push(
                    (0..rows.len())
                        .map(|row| left.indicator(row, left_level) * right.indicator(row, right_level))
                        .collect(),
                );
            }
        }
    }

    let x = DMatrix::from_fn(rows.len(), columns.len(), |row, col| columns[col][row]);
    let y = DVector::from_vec(response);
    Ok(DesignMatrix { terms, x, y })
}

/// Compares two level strings the way [`sort_levels`] orders numeric levels.
pub fn compare_numeric_levels(a: &str, b: &str) -> Ordering {
    match (parse_f64(a), parse_f64(b)) {
        (Some(left), Some(right)) => left.total_cmp(&right),
        _ => a.cmp(b),
    }
}
