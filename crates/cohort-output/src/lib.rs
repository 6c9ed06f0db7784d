//! Export of significant regression coefficients.

pub mod error;
pub mod export;

pub use error::{OutputError, Result};
pub use export::{
    DATASET_COLUMN, DEPENDENT_VARIABLE_COLUMN, ExportOutcome, ExportRow,
    INDEPENDENT_VARIABLE_COLUMN, REFERENCE_GROUP_COLUMN, export_header,
    export_significant_results, flatten_results, format_float,
};
