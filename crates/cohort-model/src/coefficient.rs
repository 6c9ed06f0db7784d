//! Per-outcome coefficient tables.

use serde::Serialize;

/// Column names of a coefficient table, in export order.
pub const COEF_COLUMN: &str = "Coef.";
pub const STD_ERR_COLUMN: &str = "Std.Err.";
pub const T_COLUMN: &str = "t";
pub const P_COLUMN: &str = "P>|t|";
pub const CI_LOWER_COLUMN: &str = "[0.025";
pub const CI_UPPER_COLUMN: &str = "0.975]";
pub const P_CORRECTED_COLUMN: &str = "P>|t| (corrected)";

pub const COEFFICIENT_COLUMNS: [&str; 7] = [
    COEF_COLUMN,
    STD_ERR_COLUMN,
    T_COLUMN,
    P_COLUMN,
    CI_LOWER_COLUMN,
    CI_UPPER_COLUMN,
    P_CORRECTED_COLUMN,
];

/// One model term with its estimate and inference statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoefficientRow {
    /// Term name, e.g. `Intercept` or `C(group)[T.B]`.
    pub term: String,
    pub coef: f64,
    pub std_err: f64,
    pub t: f64,
    pub p_value: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    /// Outcome-level FDR-corrected p-value, shared by every row of a table.
    pub p_corrected: f64,
}

impl CoefficientRow {
    /// Values in [`COEFFICIENT_COLUMNS`] order.
    pub fn values(&self) -> [f64; 7] {
        [
            self.coef,
            self.std_err,
            self.t,
            self.p_value,
            self.ci_lower,
            self.ci_upper,
            self.p_corrected,
        ]
    }
}

/// Ordered coefficient rows of one fitted outcome model.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoefficientTable {
    pub rows: Vec<CoefficientRow>,
}

impl CoefficientTable {
    pub fn new(rows: Vec<CoefficientRow>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, term: &str) -> Option<&CoefficientRow> {
        self.rows.iter().find(|row| row.term == term)
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.term.as_str())
    }

    /// Keeps rows whose corrected p-value is strictly below `alpha`.
    #[must_use]
    pub fn filter_significant(self, alpha: f64) -> Self {
        Self {
            rows: self
                .rows
                .into_iter()
                .filter(|row| row.p_corrected < alpha)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(term: &str, p_corrected: f64) -> CoefficientRow {
        CoefficientRow {
            term: term.to_string(),
            coef: 1.0,
            std_err: 0.5,
            t: 2.0,
            p_value: 0.06,
            ci_lower: 0.0,
            ci_upper: 2.0,
            p_corrected,
        }
    }

    #[test]
    fn filter_is_strict() {
        let table = CoefficientTable::new(vec![row("Intercept", 0.05), row("C(group)[T.B]", 0.01)]);
        let kept = table.filter_significant(0.05);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept.rows[0].term, "C(group)[T.B]");
    }

    #[test]
    fn values_follow_column_order() {
        let values = row("Intercept", 0.2).values();
        assert_eq!(values.len(), COEFFICIENT_COLUMNS.len());
        assert_eq!(values[0], 1.0);
        assert_eq!(values[6], 0.2);
    }
}
