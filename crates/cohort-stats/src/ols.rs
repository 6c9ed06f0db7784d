//! Ordinary least squares with t and whole-model F inference.
//!
//! Coefficients come from the SVD pseudo-inverse of the design, so
//! rank-deficient designs still produce estimates; the numerical rank drives
//! the degrees of freedom (`df_model = rank - 1`, `df_resid = nobs - rank`).

use nalgebra::DMatrix;
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

use cohort_model::{CoefficientRow, CoefficientTable};

use crate::design::DesignMatrix;
use crate::error::FitError;

/// Two-sided confidence level of the reported intervals.
const CONFIDENCE: f64 = 0.95;

/// A fitted OLS model.
#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    pub terms: Vec<String>,
    pub params: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub t_values: Vec<f64>,
    pub p_values: Vec<f64>,
    pub conf_int: Vec<(f64, f64)>,
    pub nobs: usize,
    pub rank: usize,
    pub df_model: f64,
    pub df_resid: f64,
    /// Sum of squared residuals.
    pub ssr: f64,
    /// Centered total sum of squares.
    pub centered_tss: f64,
    pub rsquared: f64,
    pub f_value: f64,
    pub f_pvalue: f64,
}

impl OlsFit {
    /// Coefficient table with `p_corrected` set on every row.
    pub fn coefficient_table(&self, p_corrected: f64) -> CoefficientTable {
        let rows = self
            .terms
            .iter()
            .enumerate()
            .map(|(idx, term)| CoefficientRow {
                term: term.clone(),
                coef: self.params[idx],
                std_err: self.std_errors[idx],
                t: self.t_values[idx],
                p_value: self.p_values[idx],
                ci_lower: self.conf_int[idx].0,
                ci_upper: self.conf_int[idx].1,
                p_corrected,
            })
            .collect();
        CoefficientTable::new(rows)
    }
}

/// Fits `y ~ X` by least squares.
pub fn fit_ols(design: &DesignMatrix) -> Result<OlsFit, FitError> {
    let nobs = design.nobs();
    if nobs == 0 {
        return Err(FitError::NoObservations);
    }
    let y = &design.y;
    let first = y[0];
    if y.iter().all(|value| *value == first) {
        return Err(FitError::ConstantOutcome);
    }

    let x = &design.x;
    let svd = x.clone().svd(true, true);
    let max_singular = svd.singular_values.max();
    let tolerance = max_singular * (nobs.max(design.ncols()) as f64) * f64::EPSILON;
    let rank = svd.rank(tolerance);
    if rank >= nobs {
        return Err(FitError::InsufficientObservations { nobs, rank });
    }
    if rank <= 1 {
        return Err(FitError::NoPredictors);
    }
    let pinv = svd
        .pseudo_inverse(tolerance)
        .map_err(|err| FitError::Decomposition(err.to_string()))?;

    let beta = &pinv * y;
    let residuals = y - x * &beta;
    let ssr = residuals.norm_squared();
    let mean = y.mean();
    let centered_tss: f64 = y.iter().map(|value| (value - mean).powi(2)).sum();
    if ssr <= centered_tss * 1e-20 {
        return Err(FitError::PerfectFit);
    }

    let df_resid = (nobs - rank) as f64;
    let df_model = (rank - 1) as f64;
    let scale = ssr / df_resid;
    let normalized_cov: DMatrix<f64> = &pinv * pinv.transpose();

    let t_dist = StudentsT::new(0.0, 1.0, df_resid)
        .map_err(|err| FitError::Distribution(err.to_string()))?;
    let critical = t_dist.inverse_cdf(1.0 - (1.0 - CONFIDENCE) / 2.0);

    let params: Vec<f64> = beta.iter().copied().collect();
    let std_errors: Vec<f64> = (0..params.len())
        .map(|idx| (scale * normalized_cov[(idx, idx)]).max(0.0).sqrt())
        .collect();
    let t_values: Vec<f64> = params
        .iter()
        .zip(&std_errors)
        .map(|(param, se)| param / se)
        .collect();
    let p_values: Vec<f64> = t_values
        .iter()
        .map(|t| (2.0 * t_dist.sf(t.abs())).min(1.0))
        .collect();
    let conf_int: Vec<(f64, f64)> = params
        .iter()
        .zip(&std_errors)
        .map(|(param, se)| (param - critical * se, param + critical * se))
        .collect();

    let explained = (centered_tss - ssr).max(0.0);
    let f_value = (explained / df_model) / scale;
    if !f_value.is_finite() {
        return Err(FitError::NonFiniteStatistic {
            statistic: "F statistic",
        });
    }
    let f_dist = FisherSnedecor::new(df_model, df_resid)
        .map_err(|err| FitError::Distribution(err.to_string()))?;
    let f_pvalue = f_dist.sf(f_value);
    if !f_pvalue.is_finite() {
        return Err(FitError::NonFiniteStatistic {
            statistic: "F-test p-value",
        });
    }

    Ok(OlsFit {
        terms: design.terms.clone(),
        params,
        std_errors,
        t_values,
        p_values,
        conf_int,
        nobs,
        rank,
        df_model,
        df_resid,
        ssr,
        centered_tss,
        rsquared: 1.0 - ssr / centered_tss,
        f_value,
        f_pvalue,
    })
}
