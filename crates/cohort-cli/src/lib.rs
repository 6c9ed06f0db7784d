//! Library components of the cohort regression CLI.

pub mod config;
pub mod logging;
pub mod pipeline;
pub mod types;
