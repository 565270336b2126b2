/// Console output helpers shared by the commands
use crate::core::pipeline::PipelineReport;
use colored::*;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color as TableColor, ContentArrangement, Table};

/// Display a section header with an underline
pub fn section_header(title: &str) {
    println!("\n{}", title.bold().cyan());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn info(message: &str) {
    println!("{} {}", "●".blue(), message);
}

pub fn warning(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

pub fn action(message: &str) {
    println!("{} {}", "▶".cyan(), message);
}

/// Create a table with the standard styling
pub fn create_standard_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .add_attribute(Attribute::Bold)
        .fg(TableColor::Cyan)
}

/// Format a number with thousands separator
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

/// Per-stage counts of a finished run
pub fn report_table(report: &PipelineReport) -> Table {
    let mut table = create_standard_table();
    table.set_header(vec![header_cell("Stage"), header_cell("In"), header_cell("Out")]);

    let length = &report.length_filter;
    let homology = &report.homology;
    table.add_row(vec![
        Cell::new("Length/composition filter"),
        Cell::new(format_number(report.input_sequences)),
        Cell::new(format_number(length.kept)),
    ]);
    table.add_row(vec![
        Cell::new("Homology filter"),
        Cell::new(format_number(homology.pool_size)),
        Cell::new(format_number(homology.retained)),
    ]);
    table.add_row(vec![
        Cell::new("Anchors added"),
        Cell::new("-"),
        Cell::new(format_number(report.anchors_added_to_pool)),
    ]);
    table.add_row(vec![
        Cell::new("Clustering"),
        Cell::new(format_number(homology.retained + report.anchors_added_to_pool)),
        Cell::new(format_number(report.clusters)),
    ]);
    table.add_row(vec![
        Cell::new("Profile alignment"),
        Cell::new(format_number(report.aligned_sequences)),
        Cell::new(format!("width {}", report.alignment_width)),
    ]);
    table.add_row(vec![
        Cell::new("Dataset"),
        Cell::new(format_number(report.aligned_sequences)),
        Cell::new(format_number(report.dataset_rows)),
    ]);
    table
}

pub fn print_report(report: &PipelineReport) {
    section_header("Curation Summary");
    println!("{}", report_table(report));
    info(&format!(
        "Average kept length after length filter: {:.1}",
        report.length_filter.average_kept_length
    ));
    info(&format!(
        "Homology hits: {} parsed, {} qualifying",
        format_number(report.homology.hits),
        format_number(report.homology.qualifying_hits)
    ));
    info(&format!(
        "Finished in {:.1}s",
        report.duration().num_milliseconds() as f64 / 1000.0
    ));
}
