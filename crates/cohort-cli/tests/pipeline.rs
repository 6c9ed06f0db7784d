//! End-to-end runs of the analysis pipeline over a small release folder.

use std::fmt::Write as _;
use std::path::Path;

use tempfile::TempDir;

use cohort_cli::config::{AnalysisConfig, GroupConfig};
use cohort_cli::pipeline::{list_datasets, run_analysis};
use cohort_output::ExportOutcome;

const SIGNAL: [f64; 13] = [
    1.0, 1.2, 0.9, 1.1, 1.05, 0.95, 3.0, 3.1, 2.9, 3.2, 2.8, 3.05, 9.5,
];
const NULL: [f64; 13] = [
    1.0, 3.0, 2.0, 2.0, 3.0, 1.0, 1.0, 3.0, 2.0, 2.0, 3.0, 1.0, 2.0,
];

fn subject(index: usize) -> String {
    format!("S{:02}", index + 1)
}

fn write_release(dir: &Path) {
    let mut demo = String::from(
        "src_subject_id,eventname,demo_gender_id_v2,demo_race_a_p___10,demo_race_a_p___11,demo_race_a_p___12\n",
    );
    let mut fa = String::from("src_subject_id,eventname,dmri_fa_left,dmri_fa_right\n");
    for index in 0..13 {
        let gender = if index % 2 == 0 { 1 } else { 2 };
        writeln!(demo, "{},baseline_year_1_arm_1,{gender},1,0,0", subject(index)).unwrap();
        writeln!(
            fa,
            "{},baseline_year_1_arm_1,{:.2},{:.1}",
            subject(index),
            SIGNAL[index],
            NULL[index]
        )
        .unwrap();
        writeln!(fa, "{},2_year_follow_up_y_arm_1,0.50,0.5", subject(index)).unwrap();
    }
    std::fs::write(dir.join("abcd_p_demo.csv"), demo).unwrap();
    std::fs::write(dir.join("mri_y_dti_fa_fs_at.csv"), fa).unwrap();

    let mut control = String::from("src_subject_id\n");
    for index in 0..6 {
        writeln!(control, "{}", subject(index)).unwrap();
    }
    std::fs::write(dir.join("control.csv"), control).unwrap();

    let mut case = String::from("src_subject_id,sleep_flag\n");
    for index in 6..12 {
        writeln!(case, "{},1", subject(index)).unwrap();
    }
    writeln!(case, "{},0", subject(12)).unwrap();
    std::fs::write(dir.join("case.csv"), case).unwrap();
}

fn config(dir: &Path) -> AnalysisConfig {
    AnalysisConfig {
        data_dir: dir.to_path_buf(),
        groups: vec![
            GroupConfig {
                label: "control".to_string(),
                file: "control.csv".into(),
                flag: None,
            },
            GroupConfig {
                label: "case".to_string(),
                file: "case.csv".into(),
                flag: Some("sleep_flag".to_string()),
            },
        ],
        reference_orders: vec![vec!["control".to_string(), "case".to_string()]],
        covariates: vec!["demo_gender_id_v2".to_string()],
        output: dir.join("out").join("significant_p_values_dti.csv"),
        ..AnalysisConfig::default()
    }
}

#[test]
fn analysis_exports_significant_coefficients() {
    let dir = TempDir::new().unwrap();
    write_release(dir.path());
    let config = config(dir.path());
    config.validate().unwrap();

    let run = run_analysis(&config, false).unwrap();
    assert!(!run.has_errors, "{:?}", run.errors);
    assert_eq!(run.units.len(), 1);
    let unit = &run.units[0];
    assert_eq!(unit.key.dataset, "abcd_dti_fa_fs_at_baseline");
    assert_eq!(unit.key.reference_group, "control");
    assert_eq!(unit.subjects, 12);
    assert_eq!(unit.attempted, 2);
    assert_eq!(unit.fitted, 2);
    assert_eq!(unit.significant_outcomes, 1);

    assert_eq!(
        run.export,
        Some(ExportOutcome::Written {
            path: config.output.clone(),
            rows: 3
        })
    );
    let content = std::fs::read_to_string(&config.output).unwrap();
    assert!(content.contains("abcd_dti_fa_fs_at_baseline,control,dmri_fa_left,C(group)[T.case]"));
    assert!(!content.contains("dmri_fa_right"));
}

#[test]
fn interaction_run_exports_product_terms() {
    let dir = TempDir::new().unwrap();
    write_release(dir.path());
    let mut config = config(dir.path());
    config.interaction = true;
    config.validate().unwrap();

    let run = run_analysis(&config, false).unwrap();
    assert!(!run.has_errors, "{:?}", run.errors);
    let report = &run.results[0].1;
    let left = report.get("dmri_fa_left").unwrap();
    assert_eq!(left.table.len(), 4);
    assert!(report.get("dmri_fa_right").unwrap().table.is_empty());

    assert_eq!(
        run.export,
        Some(ExportOutcome::Written {
            path: config.output.clone(),
            rows: 4
        })
    );
    let content = std::fs::read_to_string(&config.output).unwrap();
    assert!(content.contains(
        "abcd_dti_fa_fs_at_baseline,control,dmri_fa_left,C(demo_gender_id_v2)[T.2]:C(group)[T.case]"
    ));
}

#[test]
fn reference_group_without_subjects_aborts_the_unit() {
    let dir = TempDir::new().unwrap();
    write_release(dir.path());
    std::fs::write(dir.path().join("sibling.csv"), "src_subject_id\nS99\n").unwrap();
    let mut config = config(dir.path());
    config.groups.push(GroupConfig {
        label: "sibling".to_string(),
        file: "sibling.csv".into(),
        flag: None,
    });
    config.reference_orders = vec![
        vec!["sibling".to_string(), "control".to_string(), "case".to_string()],
        vec!["control".to_string(), "case".to_string(), "sibling".to_string()],
    ];

    let run = run_analysis(&config, true).unwrap();
    assert!(run.has_errors);
    assert_eq!(run.units.len(), 2);
    let aborted = &run.units[0];
    assert_eq!(aborted.key.reference_group, "sibling");
    assert!(aborted.error.as_deref().is_some_and(|err| err.contains("sibling")));

    assert!(run.units[1].error.is_none());
    assert_eq!(run.results.len(), 1);
    assert_eq!(run.results[0].1.reference_group, "control");
}

#[test]
fn reversed_reference_order_is_a_separate_unit() {
    let dir = TempDir::new().unwrap();
    write_release(dir.path());
    let mut config = config(dir.path());
    config
        .reference_orders
        .push(vec!["case".to_string(), "control".to_string()]);

    let run = run_analysis(&config, true).unwrap();
    assert_eq!(run.units.len(), 2);
    assert_eq!(run.results.len(), 2);
    let reversed = &run.results[1].1;
    assert_eq!(reversed.reference_group, "case");
    let left = reversed.get("dmri_fa_left").unwrap();
    assert!(left.table.get("C(group)[T.control]").is_some());
}

#[test]
fn dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    write_release(dir.path());
    let config = config(dir.path());

    let run = run_analysis(&config, true).unwrap();
    assert!(run.export.is_none());
    assert!(!config.output.exists());
}

#[test]
fn missing_covariate_aborts_the_unit_only() {
    let dir = TempDir::new().unwrap();
    write_release(dir.path());
    let mut config = config(dir.path());
    config.covariates = vec!["interview_age".to_string()];

    let run = run_analysis(&config, false).unwrap();
    assert!(run.has_errors);
    assert_eq!(run.units.len(), 1);
    assert!(run.units[0].error.is_some());
    assert_eq!(run.export, Some(ExportOutcome::NothingSignificant));
    assert!(!config.output.exists());
}

#[test]
fn datasets_are_listed_at_the_timepoint() {
    let dir = TempDir::new().unwrap();
    write_release(dir.path());

    let datasets = list_datasets(&config(dir.path())).unwrap();
    assert_eq!(datasets.len(), 1);
    assert_eq!(datasets[0].name, "abcd_dti_fa_fs_at_baseline");
    assert_eq!(datasets[0].rows, 13);
}

#[test]
fn config_with_unknown_reference_label_fails_to_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("analysis.json");
    std::fs::write(
        &path,
        r#"{
            "data_dir": "/data/release",
            "modality": "dti",
            "groups": [{"label": "control", "file": "control.csv"}],
            "reference_orders": [["control", "case"]]
        }"#,
    )
    .unwrap();

    let err = AnalysisConfig::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("case"));
}
