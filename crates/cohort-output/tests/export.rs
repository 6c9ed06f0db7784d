//! Integration tests for the results exporter.

use tempfile::TempDir;

use cohort_model::{AnalysisKey, CoefficientRow, CoefficientTable, OutcomeResult, RegressionReport};
use cohort_output::{ExportOutcome, export_significant_results};

fn row(term: &str, coef: f64) -> CoefficientRow {
    CoefficientRow {
        term: term.to_string(),
        coef,
        std_err: 0.25,
        t: coef / 0.25,
        p_value: 0.001,
        ci_lower: coef - 0.5,
        ci_upper: coef + 0.5,
        p_corrected: 0.004,
    }
}

fn outcome(name: &str, rows: Vec<CoefficientRow>) -> OutcomeResult {
    OutcomeResult {
        outcome: name.to_string(),
        nobs: 12,
        f_pvalue: 0.002,
        corrected_pvalue: 0.004,
        table: CoefficientTable::new(rows),
    }
}

fn report(reference: &str, outcomes: Vec<OutcomeResult>) -> RegressionReport {
    RegressionReport {
        reference_group: reference.to_string(),
        attempted: outcomes.len(),
        outcomes,
        failures: Vec::new(),
    }
}

#[test]
fn significant_rows_are_flattened_in_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("results").join("significant_p_values_dti.csv");
    let results = vec![
        (
            AnalysisKey::new("abcd_dti_fa_baseline", "control"),
            report(
                "control",
                vec![
                    outcome("fa_left", vec![row("Intercept", 1.5), row("C(group)[T.case]", 2.0)]),
                    outcome("fa_right", Vec::new()),
                ],
            ),
        ),
        (
            AnalysisKey::new("abcd_dti_md_baseline", "control"),
            report("control", vec![outcome("md_left", vec![row("C(group)[T.case]", -0.75)])]),
        ),
    ];

    let written = export_significant_results(&results, &path).unwrap();
    assert_eq!(
        written,
        ExportOutcome::Written {
            path: path.clone(),
            rows: 3
        }
    );

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[2],
        "2.0,0.25,8.0,0.001,1.5,2.5,0.004,abcd_dti_fa_baseline,control,fa_left,C(group)[T.case]"
    );
    assert!(lines[3].ends_with("abcd_dti_md_baseline,control,md_left,C(group)[T.case]"));
    assert!(!content.contains("fa_right"));
}

#[test]
fn nothing_significant_writes_no_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("significant.csv");
    let results = vec![(
        AnalysisKey::new("abcd_dti_fa_baseline", "control"),
        report("control", vec![outcome("fa_left", Vec::new())]),
    )];

    let outcome = export_significant_results(&results, &path).unwrap();
    assert_eq!(outcome, ExportOutcome::NothingSignificant);
    assert!(!path.exists());
}

#[test]
fn nothing_significant_leaves_earlier_file_in_place() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("significant.csv");
    std::fs::write(&path, "earlier run\n").unwrap();
    let results = vec![(
        AnalysisKey::new("abcd_dti_fa_baseline", "control"),
        report("control", vec![outcome("fa_left", Vec::new())]),
    )];

    let outcome = export_significant_results(&results, &path).unwrap();
    assert_eq!(outcome, ExportOutcome::NothingSignificant);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "earlier run\n");
}

#[test]
fn repeated_exports_are_byte_identical() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.csv");
    let second = dir.path().join("second.csv");
    let results = vec![(
        AnalysisKey::new("abcd_dti_fa_baseline", "control"),
        report("control", vec![outcome("fa_left", vec![row("Intercept", 0.1 + 0.2)])]),
    )];

    export_significant_results(&results, &first).unwrap();
    export_significant_results(&results, &second).unwrap();
    assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
}
