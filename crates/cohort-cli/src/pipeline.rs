//! Analysis pipeline with explicit stages.
//!
//! 1. **Ingest**: demographics, derived per-subject columns, group tables
//! 2. **Discover**: measurement tables of the configured modality
//! 3. **Merge**: join every group with each measurement table
//! 4. **Analyze**: one regression batch per `(dataset, reference order)` unit
//! 5. **Export**: significant coefficients of all units into one CSV
//!
//! A configuration problem in one unit aborts that unit only; the run keeps
//! going and reports it.

use std::collections::BTreeSet;
use std::time::Instant;

use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use tracing::{debug, error, info, info_span};

use cohort_ingest::{
    DiscoveredTable, GroupTable, add_column_from, combine_groups, discover_modality_tables,
    filter_timepoint, load_timepoint_table, merge_and_keep_columns, preprocess_demographics,
    read_csv_table,
};
use cohort_model::{AnalysisKey, RegressionReport};
use cohort_output::export_significant_results;
use cohort_stats::{run_regression, run_regression_with_interaction};

use crate::config::AnalysisConfig;
use crate::types::{AnalysisRun, DatasetListing, UnitSummary};

// ============================================================================
// Stage 1: Ingest
// ============================================================================

/// Group tables joined with the preprocessed demographics.
#[derive(Debug)]
pub struct CohortInputs {
    pub demographics: DataFrame,
    pub groups: Vec<GroupTable>,
}

/// Loads demographics and group membership tables.
pub fn ingest(config: &AnalysisConfig) -> Result<CohortInputs> {
    let span = info_span!("ingest");
    let _guard = span.enter();
    let start = Instant::now();
    let subject = config.subject_column.as_str();
    let timepoint = config.timepoint_filter();

    let demographics_path = config.resolve(&config.demographics.file);
    let mut demographics =
        preprocess_demographics(&demographics_path, &timepoint, &config.demographics.race)
            .with_context(|| format!("preprocess {}", demographics_path.display()))?;

    for derived in &config.derived_columns {
        let path = config.resolve(&derived.file);
        let mut source = read_csv_table(&path).with_context(|| format!("read {}", path.display()))?;
        if source.column(&timepoint.column).is_ok() {
            source = filter_timepoint(&source, &path.display().to_string(), &timepoint)?;
        }
        demographics = add_column_from(&source, &derived.source, &demographics, &derived.target, subject)
            .with_context(|| format!("derive column {}", derived.target))?;
        debug!(column = %derived.target, source = %path.display(), "added derived column");
    }

    let mut members = Vec::with_capacity(config.groups.len());
    for group in &config.groups {
        let path = config.resolve(&group.file);
        let data = read_csv_table(&path).with_context(|| format!("read group {}", group.label))?;
        let mut table = GroupTable::new(group.label.clone(), data);
        if let Some(flag) = &group.flag {
            table = table
                .filter_by_flag(flag)
                .with_context(|| format!("filter group {}", group.label))?;
        }
        let columns = member_columns(config, &table.data);
        table.data = table
            .data
            .select(columns.iter().map(String::as_str))
            .with_context(|| format!("select columns of group {}", group.label))?;
        debug!(group = %group.label, subjects = table.data.height(), "loaded group");
        members.push(table);
    }

    let groups = merge_and_keep_columns(&members, &demographics, subject, None)
        .context("join groups with demographics")?;
    info!(
        groups = groups.len(),
        subjects = groups.iter().map(|g| g.data.height()).sum::<usize>(),
        duration_ms = start.elapsed().as_millis(),
        "ingest complete"
    );
    Ok(CohortInputs {
        demographics,
        groups,
    })
}

/// Subject key plus the configured extra columns present in a group table.
fn member_columns(config: &AnalysisConfig, data: &DataFrame) -> Vec<String> {
    let mut columns = vec![config.subject_column.clone()];
    columns.extend(
        config
            .keep_columns
            .iter()
            .filter(|name| data.column(name).is_ok() && **name != config.subject_column)
            .cloned(),
    );
    columns
}

// ============================================================================
// Stage 2: Discover
// ============================================================================

pub fn discover(config: &AnalysisConfig) -> Result<Vec<DiscoveredTable>> {
    let tables = discover_modality_tables(&config.data_dir, &config.modality, &config.pattern)
        .with_context(|| format!("discover tables in {}", config.data_dir.display()))?;
    info!(
        modality = %config.modality,
        pattern = %config.pattern,
        tables = tables.len(),
        "discovered measurement tables"
    );
    Ok(tables)
}

/// Discovered tables with their row counts at the configured timepoint.
pub fn list_datasets(config: &AnalysisConfig) -> Result<Vec<DatasetListing>> {
    let timepoint = config.timepoint_filter();
    discover(config)?
        .into_iter()
        .map(|table| {
            let data = load_timepoint_table(&table.path, &table.name, &timepoint)
                .with_context(|| format!("load {}", table.name))?;
            Ok(DatasetListing {
                name: table.name,
                path: table.path,
                rows: data.height(),
                columns: data.width(),
            })
        })
        .collect()
}

// ============================================================================
// Stage 3: Merge
// ============================================================================

/// Columns of the analysis frame: subject, model covariates, carried
/// columns, then every measurement column of the dataset.
pub fn analysis_columns(config: &AnalysisConfig, dataset: &DataFrame) -> Vec<String> {
    let mut columns = vec![config.subject_column.clone()];
    columns.extend(config.covariates.iter().cloned());
    columns.extend(config.derived_columns.iter().map(|d| d.target.clone()));
    columns.extend(config.keep_columns.iter().cloned());
    let mut seen = BTreeSet::new();
    columns.retain(|name| seen.insert(name.clone()));

    for column in dataset.get_column_names() {
        let name = column.to_string();
        if name != config.timepoint_column && seen.insert(name.clone()) {
            columns.push(name);
        }
    }
    columns
}

pub fn merge_dataset(
    config: &AnalysisConfig,
    inputs: &CohortInputs,
    dataset: &DataFrame,
) -> Result<Vec<GroupTable>> {
    let keep = analysis_columns(config, dataset);
    let merged = merge_and_keep_columns(&inputs.groups, dataset, &config.subject_column, Some(&keep))?;
    Ok(merged)
}

// ============================================================================
// Stage 4: Analyze
// ============================================================================

/// Runs every reference order against one merged dataset.
pub fn analyze_dataset(
    config: &AnalysisConfig,
    dataset: &str,
    merged: &[GroupTable],
) -> (Vec<UnitSummary>, Vec<(AnalysisKey, RegressionReport)>) {
    let options = config.regression_options();
    let mut units = Vec::with_capacity(config.reference_orders.len());
    let mut results = Vec::with_capacity(config.reference_orders.len());

    for order in &config.reference_orders {
        let reference = order.first().cloned().unwrap_or_default();
        let key = AnalysisKey::new(dataset, reference.clone());
        let span = info_span!("unit", dataset = %dataset, reference_group = %reference);
        let _guard = span.enter();
        let start = Instant::now();

        let cohort = match combine_groups(merged, order, &config.subject_column) {
            Ok(cohort) => cohort,
            Err(err) => {
                error!(error = %err, "failed to assemble cohort");
                units.push(UnitSummary::aborted(key, 0, err.to_string()));
                continue;
            }
        };
        let subjects = cohort.data.height();
        let report = if config.interaction {
            run_regression_with_interaction(
                &cohort.data,
                order,
                &options,
                &config.interaction_covariate,
            )
        } else {
            run_regression(&cohort.data, order, &options)
        };
        match report {
            Ok(report) => {
                info!(
                    subjects,
                    fitted = report.fitted_count(),
                    significant_rows = report.significant_rows(),
                    duration_ms = start.elapsed().as_millis(),
                    "unit complete"
                );
                units.push(UnitSummary::from_report(key.clone(), subjects, &report));
                results.push((key, report));
            }
            Err(err) => {
                error!(error = %err, "regression aborted");
                units.push(UnitSummary::aborted(key, subjects, err.to_string()));
            }
        }
    }
    (units, results)
}

// ============================================================================
// Stage 5: Export and the full run
// ============================================================================

/// Runs the whole pipeline. With `dry_run` nothing is written.
pub fn run_analysis(config: &AnalysisConfig, dry_run: bool) -> Result<AnalysisRun> {
    let run_start = Instant::now();
    let inputs = ingest(config)?;
    let tables = discover(config)?;
    let timepoint = config.timepoint_filter();

    let mut units = Vec::new();
    let mut results = Vec::new();
    let mut errors = Vec::new();
    for table in &tables {
        let span = info_span!("dataset", dataset = %table.name);
        let _guard = span.enter();

        let merged = load_timepoint_table(&table.path, &table.name, &timepoint)
            .map_err(anyhow::Error::from)
            .and_then(|dataset| merge_dataset(config, &inputs, &dataset));
        let merged = match merged {
            Ok(merged) => merged,
            Err(err) => {
                error!(error = %err, "failed to prepare dataset");
                for order in &config.reference_orders {
                    let reference = order.first().cloned().unwrap_or_default();
                    let key = AnalysisKey::new(table.name.clone(), reference);
                    units.push(UnitSummary::aborted(key, 0, err.to_string()));
                }
                continue;
            }
        };

        let (dataset_units, dataset_results) = analyze_dataset(config, &table.name, &merged);
        units.extend(dataset_units);
        results.extend(dataset_results);
    }
    for unit in &units {
        if let Some(err) = &unit.error {
            errors.push(format!("{}: {err}", unit.key));
        }
    }

    let output = config.output.clone();
    let export = if dry_run {
        info!("dry run; skipping export");
        None
    } else {
        Some(
            export_significant_results(&results, &output)
                .with_context(|| format!("export {}", output.display()))?,
        )
    };

    info!(
        datasets = tables.len(),
        units = units.len(),
        errors = errors.len(),
        duration_ms = run_start.elapsed().as_millis(),
        "analysis complete"
    );
    let has_errors = !errors.is_empty();
    Ok(AnalysisRun {
        units,
        results,
        export,
        output,
        errors,
        has_errors,
    })
}
