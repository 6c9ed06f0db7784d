//! Cohort assembly: joining group tables with measurements and stacking them.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::*;

use cohort_common::{any_to_i64, column_f64, column_strings};
use cohort_model::GROUP_COLUMN;

use crate::error::{IngestError, Result};

/// Subjects belonging to one cohort group.
#[derive(Debug, Clone)]
pub struct GroupTable {
    pub label: String,
    pub data: DataFrame,
}

impl GroupTable {
    pub fn new(label: impl Into<String>, data: DataFrame) -> Self {
        Self {
            label: label.into(),
            data,
        }
    }

    /// Rows whose `column` flag equals 1.
    pub fn filter_by_flag(&self, column: &str) -> Result<Self> {
        let flag = require_column(&self.data, column, &self.label)?;
        let mask: Vec<bool> = column_f64(flag)?
            .iter()
            .map(|value| *value == Some(1.0))
            .collect();
        let mask = BooleanChunked::from_slice("flag".into(), &mask);
        Ok(Self::new(self.label.clone(), self.data.filter(&mask)?))
    }
}

/// Stacked cohort ready for regression.
#[derive(Debug, Clone)]
pub struct CombinedCohort {
    pub data: DataFrame,
    /// Rows dropped because their subject already appeared in an earlier group.
    pub duplicates_dropped: usize,
}

/// Inner-joins every group with `dataset` on the subject key.
///
/// Dataset columns that the group table already carries are taken from the
/// group side. When `keep` is given the joined frames are reduced to exactly
/// those columns, in that order.
pub fn merge_and_keep_columns(
    groups: &[GroupTable],
    dataset: &DataFrame,
    subject: &str,
    keep: Option<&[String]>,
) -> Result<Vec<GroupTable>> {
    require_column(dataset, subject, "dataset")?;
    let mut merged = Vec::with_capacity(groups.len());
    for group in groups {
        require_column(&group.data, subject, &group.label)?;
        let joined = join_on_subject(&group.data, dataset, subject)?;
        let data = match keep {
            Some(columns) => {
                for column in columns {
                    require_column(&joined, column, &group.label)?;
                }
                joined.select(columns.iter().map(String::as_str))?
            }
            None => joined,
        };
        tracing::debug!(group = %group.label, rows = data.height(), "merged group with dataset");
        merged.push(GroupTable::new(group.label.clone(), data));
    }
    Ok(merged)
}

fn join_on_subject(left: &DataFrame, right: &DataFrame, subject: &str) -> Result<DataFrame> {
    let left_names: BTreeSet<String> = left
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let right_names: Vec<String> = right
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .filter(|name| name == subject || !left_names.contains(name))
        .collect();
    let right = right.select(right_names.iter().map(String::as_str))?;

    let joined = left
        .clone()
        .lazy()
        .join(
            right.lazy(),
            [col(subject)],
            [col(subject)],
            JoinArgs::new(JoinType::Inner),
        )
        .sort([subject], SortMultipleOptions::default())
        .collect()?;
    Ok(joined)
}

/// Keeps the rows of every group whose `column` flag equals 1.
pub fn filter_groups_by_flag(groups: &[GroupTable], column: &str) -> Result<Vec<GroupTable>> {
    groups
        .iter()
        .map(|group| group.filter_by_flag(column))
        .collect()
}

/// Copies a per-subject integer column from `src` onto `target`.
///
/// Subjects absent from `src`, and missing source values, become 0.
pub fn add_column_from(
    src: &DataFrame,
    src_col: &str,
    target: &DataFrame,
    target_col: &str,
    subject: &str,
) -> Result<DataFrame> {
    let values = require_column(src, src_col, "source table")?;
    let src_subjects = column_strings(require_column(src, subject, "source table")?)?;
    let mut by_subject: BTreeMap<String, i64> = BTreeMap::new();
    for (idx, id) in src_subjects.into_iter().enumerate() {
        if let Some(id) = id {
            let value = any_to_i64(values.get(idx)?).unwrap_or(0);
            by_subject.insert(id, value);
        }
    }

    let target_subjects = column_strings(require_column(target, subject, "target table")?)?;
    let mapped: Vec<i64> = target_subjects
        .iter()
        .map(|id| {
            id.as_ref()
                .and_then(|id| by_subject.get(id).copied())
                .unwrap_or(0)
        })
        .collect();

    let mut out = target.clone();
    out.with_column(Series::new(target_col.into(), mapped))?;
    Ok(out)
}

/// Tags each group with its label, stacks them, and keeps rows whose label
/// is in `labels`.
///
/// A subject listed in more than one group keeps its first row only.
pub fn combine_groups(
    groups: &[GroupTable],
    labels: &[String],
    subject: &str,
) -> Result<CombinedCohort> {
    let wanted: BTreeSet<&str> = labels.iter().map(String::as_str).collect();
    let mut combined: Option<DataFrame> = None;
    for group in groups.iter().filter(|group| wanted.contains(group.label.as_str())) {
        let mut frame = group.data.clone();
        let tag = vec![group.label.as_str(); frame.height()];
        frame.with_column(Series::new(GROUP_COLUMN.into(), tag))?;
        match combined.as_mut() {
            Some(stacked) => {
                let names: Vec<String> = stacked
                    .get_column_names()
                    .iter()
                    .map(|name| name.to_string())
                    .collect();
                for name in &names {
                    require_column(&frame, name, &group.label)?;
                }
                let aligned = frame.select(names.iter().map(String::as_str))?;
                stacked.vstack_mut(&aligned)?;
            }
            None => combined = Some(frame),
        }
    }

    let Some(mut data) = combined else {
        return Err(IngestError::EmptyCohort {
            labels: labels.join(", "),
        });
    };
    let duplicates_dropped = dedupe_subjects(&mut data, subject)?;
    if duplicates_dropped > 0 {
        tracing::warn!(
            duplicates_dropped,
            "subjects found in more than one group; keeping the first occurrence"
        );
    }
    Ok(CombinedCohort {
        data,
        duplicates_dropped,
    })
}

fn dedupe_subjects(df: &mut DataFrame, subject: &str) -> Result<usize> {
    let ids = column_strings(require_column(df, subject, "cohort")?)?;
    let mut seen = BTreeSet::new();
    let keep: Vec<bool> = ids
        .iter()
        .map(|id| match id {
            Some(id) => seen.insert(id.clone()),
            None => true,
        })
        .collect();
    let dropped = keep.iter().filter(|kept| !**kept).count();
    if dropped > 0 {
        let mask = BooleanChunked::from_slice("dedupe".into(), &keep);
        *df = df.filter(&mask)?;
    }
    Ok(dropped)
}

fn require_column<'a>(df: &'a DataFrame, column: &str, table: &str) -> Result<&'a Column> {
    df.column(column).map_err(|_| IngestError::MissingColumn {
        column: column.to_string(),
        table: table.to_string(),
    })
}
