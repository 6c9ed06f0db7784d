use anyhow::Result;

use cohort_cli::config::AnalysisConfig;
use cohort_cli::pipeline::{list_datasets, run_analysis};
use cohort_cli::types::{AnalysisRun, DatasetListing};

use crate::cli::{AnalyzeArgs, DatasetsArgs};

pub fn run_analyze(args: &AnalyzeArgs) -> Result<AnalysisRun> {
    let mut config = AnalysisConfig::load(&args.config)?;
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(output) = &args.output {
        config.output = output.clone();
    }
    if args.interaction && !config.interaction {
        config.interaction = true;
        config.validate()?;
    }
    run_analysis(&config, args.dry_run)
}

pub fn run_datasets(args: &DatasetsArgs) -> Result<Vec<DatasetListing>> {
    let mut config = AnalysisConfig::load(&args.config)?;
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    list_datasets(&config)
}
