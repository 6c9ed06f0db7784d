//! Analysis configuration file.
//!
//! A JSON document describing where the data lives, which groups make up the
//! cohort, how they are compared, and where results go. Every field has a
//! default; relative input paths are resolved against `data_dir`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use cohort_ingest::{
    BASELINE_TIMEPOINT, DEFAULT_SUBJECT_COLUMN, DEFAULT_TIMEPOINT_COLUMN, RaceMapping,
    TimepointFilter,
};
use cohort_model::{
    DEFAULT_ALPHA, DEFAULT_COVARIATES, DEFAULT_INTERACTION_COVARIATE, ModelSpec, OutcomeSelection,
    RegressionOptions,
};

/// Demographics source table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemographicsConfig {
    pub file: PathBuf,
    pub race: RaceMapping,
}

impl Default for DemographicsConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("abcd_p_demo.csv"),
            race: RaceMapping::default(),
        }
    }
}

/// One cohort group: a table of member subjects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub label: String,
    pub file: PathBuf,
    /// Keep only rows where this column equals 1.
    #[serde(default)]
    pub flag: Option<String>,
}

/// A per-subject integer column copied from another table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedColumn {
    pub file: PathBuf,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub data_dir: PathBuf,
    /// Imaging modality, e.g. `dti` for `mri_y_dti_*.csv`.
    pub modality: String,
    /// Table name prefix after the modality; empty matches every table.
    pub pattern: String,
    pub timepoint: String,
    pub subject_column: String,
    pub timepoint_column: String,
    pub demographics: DemographicsConfig,
    pub groups: Vec<GroupConfig>,
    /// Each order is one comparison; its first label is the reference group.
    pub reference_orders: Vec<Vec<String>>,
    pub covariates: Vec<String>,
    /// Add an `interaction_covariate:group` interaction term.
    pub interaction: bool,
    /// Covariate crossed with the group factor; must be one of `covariates`.
    pub interaction_covariate: String,
    pub alpha: f64,
    /// Explicit outcome columns; when absent every float column is modeled.
    /// Whole-number columns with blanks load as integers, so list them here.
    pub outcomes: Option<Vec<String>>,
    pub exclude_outcomes: Vec<String>,
    pub derived_columns: Vec<DerivedColumn>,
    /// Extra group-table columns carried into the analysis frame.
    pub keep_columns: Vec<String>,
    /// Results file, relative to the working directory.
    pub output: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            modality: "dti".to_string(),
            pattern: String::new(),
            timepoint: BASELINE_TIMEPOINT.to_string(),
            subject_column: DEFAULT_SUBJECT_COLUMN.to_string(),
            timepoint_column: DEFAULT_TIMEPOINT_COLUMN.to_string(),
            demographics: DemographicsConfig::default(),
            groups: Vec::new(),
            reference_orders: Vec::new(),
            covariates: DEFAULT_COVARIATES.iter().map(|c| (*c).to_string()).collect(),
            interaction: false,
            interaction_covariate: DEFAULT_INTERACTION_COVARIATE.to_string(),
            alpha: DEFAULT_ALPHA,
            outcomes: None,
            exclude_outcomes: Vec::new(),
            derived_columns: Vec::new(),
            keep_columns: Vec::new(),
            output: PathBuf::from("significant_p_values.csv"),
        }
    }
}

impl AnalysisConfig {
    /// Reads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text =
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let config: Self =
            serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.groups.is_empty() {
            bail!("no groups configured");
        }
        let mut labels = BTreeSet::new();
        for group in &self.groups {
            if group.label.trim().is_empty() {
                bail!("group with file {} has an empty label", group.file.display());
            }
            if !labels.insert(group.label.as_str()) {
                bail!("group label '{}' is configured more than once", group.label);
            }
        }
        if self.reference_orders.is_empty() {
            bail!("no reference orders configured");
        }
        for order in &self.reference_orders {
            if order.is_empty() {
                bail!("reference order is empty");
            }
            for label in order {
                if !labels.contains(label.as_str()) {
                    bail!("reference label '{label}' is not a configured group");
                }
            }
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            bail!("alpha must lie strictly between 0 and 1, got {}", self.alpha);
        }
        if self.outcomes.as_ref().is_some_and(Vec::is_empty) {
            bail!("outcome list is empty");
        }
        self.model().validate().context("invalid model")?;
        if self.interaction {
            self.model()
                .with_group_interaction(&self.interaction_covariate)
                .validate()
                .with_context(|| {
                    format!(
                        "invalid interaction model: '{}' is not a covariate",
                        self.interaction_covariate
                    )
                })?;
        }
        Ok(())
    }

    /// Resolves a configured path against `data_dir`.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    pub fn timepoint_filter(&self) -> TimepointFilter {
        TimepointFilter::new(&self.timepoint_column, &self.timepoint)
    }

    /// Main-effects model; the pipeline adds `interaction_covariate:group`
    /// when `interaction` is set.
    pub fn model(&self) -> ModelSpec {
        ModelSpec::standard(&self.covariates)
    }

    pub fn outcome_selection(&self) -> OutcomeSelection {
        match &self.outcomes {
            Some(columns) => OutcomeSelection::Declared {
                columns: columns.clone(),
            },
            None => {
                let mut exclude = self.exclude_outcomes.clone();
                exclude.extend(self.keep_columns.iter().cloned());
                exclude.extend(self.derived_columns.iter().map(|d| d.target.clone()));
                OutcomeSelection::FloatColumns { exclude }
            }
        }
    }

    pub fn regression_options(&self) -> RegressionOptions {
        RegressionOptions {
            model: self.model(),
            outcomes: self.outcome_selection(),
            alpha: self.alpha,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> AnalysisConfig {
        serde_json::from_str(
            r#"{
                "groups": [
                    {"label": "control", "file": "control.csv"},
                    {"label": "case", "file": "case.csv", "flag": "sleep_flag"}
                ],
                "reference_orders": [["control", "case"]]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = minimal();
        assert_eq!(config.timepoint, "baseline_year_1_arm_1");
        assert_eq!(config.subject_column, "src_subject_id");
        assert_eq!(config.covariates.len(), 6);
        assert!((config.alpha - 0.05).abs() < f64::EPSILON);
        assert_eq!(config.groups[1].flag.as_deref(), Some("sleep_flag"));
        config.validate().unwrap();
    }

    #[test]
    fn test_unknown_reference_label() {
        let mut config = minimal();
        config.reference_orders = vec![vec!["control".to_string(), "bipolar".to_string()]];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("bipolar"));
    }

    #[test]
    fn test_empty_reference_order() {
        let mut config = minimal();
        config.reference_orders = vec![Vec::new()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_interaction_covariate_must_be_modeled() {
        let mut config = minimal();
        config.covariates = vec!["race".to_string()];
        config.validate().unwrap();

        config.interaction = true;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("demo_gender_id_v2"));

        config.interaction_covariate = "race".to_string();
        config.validate().unwrap();
    }

    #[test]
    fn test_no_groups() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result: std::result::Result<AnalysisConfig, _> =
            serde_json::from_str(r#"{"referenceGroups": []}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_relative_paths() {
        let config = AnalysisConfig {
            data_dir: PathBuf::from("/data/release"),
            ..minimal()
        };
        assert_eq!(
            config.resolve(Path::new("control.csv")),
            PathBuf::from("/data/release/control.csv")
        );
        assert_eq!(config.resolve(Path::new("/tmp/x.csv")), PathBuf::from("/tmp/x.csv"));
    }

    #[test]
    fn test_outcome_selection_excludes_carried_columns() {
        let mut config = minimal();
        config.keep_columns = vec!["interview_age".to_string()];
        match config.outcome_selection() {
            OutcomeSelection::FloatColumns { exclude } => {
                assert_eq!(exclude, vec!["interview_age".to_string()]);
            }
            OutcomeSelection::Declared { .. } => panic!("expected float column selection"),
        }
    }
}
