//! CSV table reading and timepoint filtering.

use std::path::Path;

use polars::prelude::*;

use cohort_common::column_strings;

use crate::error::{IngestError, Result};

/// Default subject identifier column.
pub const DEFAULT_SUBJECT_COLUMN: &str = "src_subject_id";

/// Default timepoint column.
pub const DEFAULT_TIMEPOINT_COLUMN: &str = "eventname";

/// Default timepoint value: the baseline visit.
pub const BASELINE_TIMEPOINT: &str = "baseline_year_1_arm_1";

/// Which rows of a longitudinal table belong to the analysed visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimepointFilter {
    pub column: String,
    pub value: String,
}

impl TimepointFilter {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

impl Default for TimepointFilter {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEPOINT_COLUMN, BASELINE_TIMEPOINT)
    }
}

/// Reads a CSV file with a single header row into a DataFrame.
///
/// Column types are inferred from every row so that sparse float columns are
/// not mistaken for integers.
pub fn read_csv_table(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    tracing::debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "read csv table"
    );
    Ok(df)
}

/// Keeps the rows whose timepoint column equals the filter value.
pub fn filter_timepoint(df: &DataFrame, table: &str, filter: &TimepointFilter) -> Result<DataFrame> {
    let column = df
        .column(&filter.column)
        .map_err(|_| IngestError::MissingColumn {
            column: filter.column.clone(),
            table: table.to_string(),
        })?;
    let mask: Vec<bool> = column_strings(column)?
        .iter()
        .map(|value| value.as_deref() == Some(filter.value.as_str()))
        .collect();
    let mask = BooleanChunked::from_slice("timepoint".into(), &mask);
    Ok(df.filter(&mask)?)
}

/// Reads a table and keeps only the configured timepoint.
pub fn load_timepoint_table(path: &Path, table: &str, filter: &TimepointFilter) -> Result<DataFrame> {
    let df = read_csv_table(path)?;
    let filtered = filter_timepoint(&df, table, filter)?;
    tracing::debug!(
        table,
        rows_before = df.height(),
        rows_after = filtered.height(),
        timepoint = %filter.value,
        "filtered timepoint"
    );
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_read_csv_table() {
        let file = create_temp_csv(
            "src_subject_id,eventname,fa\nS01,baseline_year_1_arm_1,0.41\nS02,2_year_follow_up_y_arm_1,\n",
        );
        let df = read_csv_table(file.path()).unwrap();

        assert_eq!(df.height(), 2);
        let names: Vec<&str> = df.get_column_names().iter().map(|name| name.as_str()).collect();
        assert_eq!(names, vec!["src_subject_id", "eventname", "fa"]);
        assert_eq!(df.column("fa").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("fa").unwrap().null_count(), 1);
    }

    #[test]
    fn test_read_csv_table_missing_file() {
        let result = read_csv_table(Path::new("/nonexistent/table.csv"));
        assert!(matches!(result, Err(IngestError::FileNotFound { .. })));
    }

    #[test]
    fn test_filter_timepoint() {
        let df = df! {
            "src_subject_id" => &["S01", "S01", "S02"],
            "eventname" => &["baseline_year_1_arm_1", "2_year_follow_up_y_arm_1", "baseline_year_1_arm_1"],
        }
        .unwrap();
        let filtered = filter_timepoint(&df, "demo", &TimepointFilter::default()).unwrap();

        assert_eq!(filtered.height(), 2);
    }

    #[test]
    fn test_filter_timepoint_missing_column() {
        let df = df! { "src_subject_id" => &["S01"] }.unwrap();
        let result = filter_timepoint(&df, "demo", &TimepointFilter::default());

        assert!(matches!(
            result,
            Err(IngestError::MissingColumn { ref column, .. }) if column == "eventname"
        ));
    }
}
