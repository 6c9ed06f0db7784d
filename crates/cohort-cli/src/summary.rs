use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use cohort_cli::types::{AnalysisRun, DatasetListing, UnitSummary};
use cohort_output::ExportOutcome;

pub fn print_summary(run: &AnalysisRun) {
    match &run.export {
        Some(ExportOutcome::Written { path, rows }) => {
            println!("Output: {} ({rows} rows)", path.display());
        }
        Some(ExportOutcome::NothingSignificant) => {
            println!("Output: no significant p-values found; nothing written");
        }
        None => println!("Output: dry run, {} not written", run.output.display()),
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Dataset"),
        header_cell("Reference"),
        header_cell("Subjects"),
        header_cell("Outcomes"),
        header_cell("Fitted"),
        header_cell("Failed"),
        header_cell("Significant"),
        header_cell("Rows"),
    ]);
    apply_table_style(&mut table);
    for index in 2..8 {
        align_column(&mut table, index, CellAlignment::Right);
    }

    let mut total_rows = 0usize;
    let mut total_significant = 0usize;
    for unit in &run.units {
        total_rows += unit.significant_rows;
        total_significant += unit.significant_outcomes;
        table.add_row(unit_row(unit));
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        count_cell(total_significant, Color::Green).add_attribute(Attribute::Bold),
        count_cell(total_rows, Color::Green).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    if !run.errors.is_empty() {
        eprintln!("Errors:");
        for error in &run.errors {
            eprintln!("- {error}");
        }
    }
}

pub fn print_datasets(datasets: &[DatasetListing]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Dataset"),
        header_cell("Rows"),
        header_cell("Columns"),
        header_cell("File"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for dataset in datasets {
        table.add_row(vec![
            Cell::new(&dataset.name),
            Cell::new(dataset.rows),
            Cell::new(dataset.columns),
            dim_cell(dataset.path.display()),
        ]);
    }
    println!("{table}");
}

fn unit_row(unit: &UnitSummary) -> Vec<Cell> {
    let dataset = Cell::new(&unit.key.dataset);
    let reference = Cell::new(&unit.key.reference_group);
    if unit.error.is_some() {
        return vec![
            dataset,
            reference,
            Cell::new(unit.subjects),
            Cell::new("aborted").fg(Color::Red),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
        ];
    }
    vec![
        dataset,
        reference,
        Cell::new(unit.subjects),
        Cell::new(unit.attempted),
        Cell::new(unit.fitted),
        count_cell(unit.failed, Color::Yellow),
        count_cell(unit.significant_outcomes, Color::Green),
        count_cell(unit.significant_rows, Color::Green),
    ]
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
