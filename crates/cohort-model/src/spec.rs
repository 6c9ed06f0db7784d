//! Model specification shared by the regression engine and the CLI config.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Default name of the group membership column.
pub const GROUP_COLUMN: &str = "group";

/// Default significance level for the FDR correction and the row filter.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Demographic covariates entered as categorical factors in every model.
pub const DEFAULT_COVARIATES: [&str; 6] = [
    "demo_gender_id_v2",
    "demo_brthdat_v2",
    "highest_household_education",
    "demo_prnt_marital_v2",
    "race",
    "household_income_per_year",
];

/// Covariate interacted with the group in the interaction variant.
pub const DEFAULT_INTERACTION_COVARIATE: &str = "demo_gender_id_v2";

/// Right-hand side of an outcome model.
///
/// Every term is an unordered categorical factor. `factors` holds main effects
/// in formula order and must contain `group_column`; `interactions` holds
/// two-way products of factors already listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub group_column: String,
    pub factors: Vec<String>,
    #[serde(default)]
    pub interactions: Vec<(String, String)>,
}

impl ModelSpec {
    /// Builds `first covariate + group + remaining covariates`.
    ///
    /// With the default covariates this is
    /// `gender + group + age + education + marital + race + income`.
    pub fn standard<S: AsRef<str>>(covariates: &[S]) -> Self {
        let mut factors: Vec<String> = Vec::with_capacity(covariates.len() + 1);
        let mut rest = covariates.iter().map(|name| name.as_ref().to_string());
        if let Some(first) = rest.next() {
            factors.push(first);
        }
        factors.push(GROUP_COLUMN.to_string());
        factors.extend(rest);
        Self {
            group_column: GROUP_COLUMN.to_string(),
            factors,
            interactions: Vec::new(),
        }
    }

    /// Adds a `covariate:group` interaction term.
    #[must_use]
    pub fn with_group_interaction(mut self, covariate: &str) -> Self {
        self.interactions
            .push((covariate.to_string(), self.group_column.clone()));
        self
    }

    pub fn has_interactions(&self) -> bool {
        !self.interactions.is_empty()
    }

    /// Factors other than the group column, in formula order.
    pub fn covariates(&self) -> impl Iterator<Item = &str> {
        self.factors
            .iter()
            .map(String::as_str)
            .filter(move |name| *name != self.group_column)
    }

    /// Checks that the group is modeled and that interactions reference known factors.
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for factor in &self.factors {
            if !seen.insert(factor.as_str()) {
                return Err(ModelError::DuplicateFactor {
                    name: factor.clone(),
                });
            }
        }
        if !seen.contains(self.group_column.as_str()) {
            return Err(ModelError::GroupNotInModel {
                group: self.group_column.clone(),
            });
        }
        for (left, right) in &self.interactions {
            if left == right {
                return Err(ModelError::SelfInteraction { name: left.clone() });
            }
            if !seen.contains(left.as_str()) || !seen.contains(right.as_str()) {
                return Err(ModelError::UnknownInteractionFactor {
                    left: left.clone(),
                    right: right.clone(),
                });
            }
        }
        Ok(())
    }

    /// Formula text, e.g. `y ~ C(a) + C(group) + C(a):C(group)`.
    pub fn formula(&self, outcome: &str) -> String {
        let mut terms: Vec<String> = self.factors.iter().map(|f| format!("C({f})")).collect();
        terms.extend(
            self.interactions
                .iter()
                .map(|(left, right)| format!("C({left}):C({right})")),
        );
        format!("{outcome} ~ {}", terms.join(" + "))
    }
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self::standard(&DEFAULT_COVARIATES)
    }
}

/// Which columns are modeled as outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum OutcomeSelection {
    /// Exactly these columns, in this order.
    Declared { columns: Vec<String> },
    /// Every floating-point column that is not a model factor and not excluded.
    FloatColumns {
        #[serde(default)]
        exclude: Vec<String>,
    },
}

impl Default for OutcomeSelection {
    fn default() -> Self {
        Self::FloatColumns {
            exclude: Vec::new(),
        }
    }
}

/// Inputs of one regression engine call besides the table and reference order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionOptions {
    pub model: ModelSpec,
    pub outcomes: OutcomeSelection,
    pub alpha: f64,
}

impl Default for RegressionOptions {
    fn default() -> Self {
        Self {
            model: ModelSpec::default(),
            outcomes: OutcomeSelection::default(),
            alpha: DEFAULT_ALPHA,
        }
    }
}
