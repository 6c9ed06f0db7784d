//! Cohort data ingestion.
//!
//! # Modules
//!
//! - **discovery**: measurement table discovery in a release folder
//! - **table**: CSV reading and timepoint filtering
//! - **cohort**: joining group tables with measurements and stacking them
//! - **demographics**: demographic preprocessing and race recoding

pub mod cohort;
pub mod demographics;
pub mod discovery;
pub mod error;
pub mod table;

pub use cohort::{
    CombinedCohort, GroupTable, add_column_from, combine_groups,
    filter_groups_by_flag, merge_and_keep_columns,
};
pub use demographics::{RACE_COLUMN, RaceIndicator, RaceMapping, preprocess_demographics, recode_race};
pub use discovery::{
    DiscoveredTable, RELEASE_PREFIX, TABLE_PREFIX, TABLE_SUFFIX, discover_modality_tables,
    discover_tables, list_csv_files,
};
pub use error::{IngestError, Result};
pub use table::{
    BASELINE_TIMEPOINT, DEFAULT_SUBJECT_COLUMN, DEFAULT_TIMEPOINT_COLUMN, TimepointFilter,
    filter_timepoint, load_timepoint_table, read_csv_table,
};
