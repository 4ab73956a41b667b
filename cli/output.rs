use colored::*;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table, presets::UTF8_FULL};
use std::path::Path;
use xreview_core::{AppError, ReviewProgress, ReviewSummary};

/// Prints run progress to the terminal. Progress goes to stdout, problems to
/// stderr; `quiet` silences both.
pub struct ConsoleProgress {
    pub quiet: bool,
}

impl ReviewProgress for ConsoleProgress {
    fn reading(&self, project_root: &Path) {
        if !self.quiet {
            println!("Reading project files from {}...", project_root.display());
        }
    }

    fn analyzing(&self, file_path: &str) {
        if !self.quiet {
            println!("Analyzing {}...", file_path);
        }
    }

    fn skipped(&self, problem: &AppError) {
        if !self.quiet {
            eprintln!("{} Skipped: {}", "⚠️".yellow(), problem);
        }
    }
}

pub fn print_no_files(extensions: &[String], quiet: bool) {
    if !quiet {
        println!("No files found with given extensions.");
        println!("  {} {}", "Extensions:".dimmed(), extensions.join(" ").cyan());
    }
}

pub fn print_completion(summary: &ReviewSummary, quiet: bool) {
    if quiet {
        return;
    }
    println!(
        "{} Analysis complete! Report saved to {}",
        "✅".green(),
        summary.report_path.display().to_string().blue()
    );
    print_summary_table(summary);
}

fn print_summary_table(summary: &ReviewSummary) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Metric").fg(Color::Green),
        Cell::new("Value").fg(Color::Green),
    ]);

    let rows = [
        ("Files analyzed", summary.files_analyzed),
        ("Chunks sent", summary.chunks_analyzed),
        ("Placeholder answers", summary.fallback_responses),
        ("Files skipped", summary.skipped_files),
    ];
    for (label, value) in rows {
        let value_cell = Cell::new(value).set_alignment(CellAlignment::Right);
        let value_cell = if label == "Placeholder answers" && value > 0 {
            value_cell.fg(Color::Yellow)
        } else {
            value_cell
        };
        table.add_row(vec![Cell::new(label).fg(Color::Cyan), value_cell]);
    }
    println!("{table}");

    if summary.fallback_responses > 0 {
        println!(
            "{}",
            "Some chunks got no answer from the model; see the report for details.".yellow()
        );
    }
}
