//! Demographic table preprocessing.

use std::collections::BTreeSet;
use std::path::Path;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use cohort_common::column_f64;

use crate::error::{IngestError, Result};
use crate::table::{TimepointFilter, filter_timepoint, read_csv_table};

/// Name of the derived race column.
pub const RACE_COLUMN: &str = "race";

/// A one-hot race indicator column and the code it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceIndicator {
    pub column: String,
    pub code: i64,
}

/// How race indicator columns collapse into a single code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceMapping {
    pub indicators: Vec<RaceIndicator>,
    /// Code for subjects with more than one distinct indicated code.
    pub multiple: i64,
    /// Code for subjects with no indicator set.
    pub unknown: i64,
}

impl Default for RaceMapping {
    fn default() -> Self {
        let indicator = |column: &str, code| RaceIndicator {
            column: column.to_string(),
            code,
        };
        Self {
            indicators: vec![
                indicator("demo_race_a_p___10", 1),
                indicator("demo_race_a_p___11", 2),
                indicator("demo_race_a_p___12", 4),
            ],
            multiple: 4,
            unknown: 0,
        }
    }
}

impl RaceMapping {
    /// Resolves one subject's indicated codes.
    pub fn code_for(&self, codes: &BTreeSet<i64>) -> i64 {
        match codes.len() {
            0 => self.unknown,
            1 => codes.iter().next().copied().unwrap_or(self.unknown),
            _ => self.multiple,
        }
    }
}

/// Adds the integer `race` column derived from the indicator columns.
pub fn recode_race(df: &DataFrame, mapping: &RaceMapping) -> Result<DataFrame> {
    let mut indicators = Vec::with_capacity(mapping.indicators.len());
    for indicator in &mapping.indicators {
        let column = df
            .column(&indicator.column)
            .map_err(|_| IngestError::MissingColumn {
                column: indicator.column.clone(),
                table: "demographics".to_string(),
            })?;
        indicators.push((indicator.code, column_f64(column)?));
    }

    let race: Vec<i64> = (0..df.height())
        .map(|row| {
            let codes: BTreeSet<i64> = indicators
                .iter()
                .filter(|(_, values)| values[row] == Some(1.0))
                .map(|(code, _)| *code)
                .collect();
            mapping.code_for(&codes)
        })
        .collect();

    let mut out = df.clone();
    out.with_column(Series::new(RACE_COLUMN.into(), race))?;
    Ok(out)
}

/// Reads the demographics table, keeps the timepoint, and recodes race.
pub fn preprocess_demographics(
    path: &Path,
    timepoint: &TimepointFilter,
    mapping: &RaceMapping,
) -> Result<DataFrame> {
    let raw = read_csv_table(path)?;
    let baseline = filter_timepoint(&raw, "demographics", timepoint)?;
    let out = recode_race(&baseline, mapping)?;
    tracing::info!(
        path = %path.display(),
        subjects = out.height(),
        "preprocessed demographics"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_frame() -> DataFrame {
        df! {
            "src_subject_id" => &["S01", "S02", "S03", "S04", "S05"],
            "demo_race_a_p___10" => &[Some(1i64), Some(0), Some(1), Some(0), None],
            "demo_race_a_p___11" => &[Some(0i64), Some(1), Some(1), Some(0), None],
            "demo_race_a_p___12" => &[Some(0i64), Some(0), Some(0), Some(1), None],
        }
        .unwrap()
    }

    #[test]
    fn test_recode_race() {
        let out = recode_race(&demo_frame(), &RaceMapping::default()).unwrap();
        let race: Vec<Option<i64>> = out.column(RACE_COLUMN).unwrap().i64().unwrap().into_iter().collect();

        assert_eq!(race, vec![Some(1), Some(2), Some(4), Some(4), Some(0)]);
    }

    #[test]
    fn test_recode_race_missing_indicator() {
        let df = demo_frame().drop("demo_race_a_p___12").unwrap();
        let result = recode_race(&df, &RaceMapping::default());
        assert!(matches!(result, Err(IngestError::MissingColumn { .. })));
    }

    #[test]
    fn test_code_for_shared_code_counts_once() {
        let mapping = RaceMapping {
            indicators: vec![
                RaceIndicator { column: "a".to_string(), code: 4 },
                RaceIndicator { column: "b".to_string(), code: 4 },
            ],
            ..RaceMapping::default()
        };
        let codes: BTreeSet<i64> = [4].into_iter().collect();
        assert_eq!(mapping.code_for(&codes), 4);
        assert_eq!(mapping.code_for(&BTreeSet::new()), 0);
    }
}
