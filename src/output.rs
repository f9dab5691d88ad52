//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Output lists environments (filters) first, with the files that contribute
//! to each shown as indented `Source:` and `Overlay:` lines, then the files
//! generated for every environment relative to the output root.
//!
//! ```text
//! Filters
//! 001 dev
//!     Source: dev.properties
//!     Overlay: ../shared/filters/dev.properties
//! 002 eu/prod
//!     Source: eu/prod.properties
//!
//! Generated
//! 001 dev
//!     app.conf → dev/app.conf
//!     bin/start.sh → dev/bin/start.sh
//! 002 eu/prod
//!     app.conf → eu/prod/app.conf
//!     bin/start.sh → eu/prod/bin/start.sh
//!
//! Missing properties
//!     /project/src/config/filters/eu/prod.properties: db.url
//!
//! Generated 4 files from 2 filters × 2 templates
//! ```
//!
//! Format functions return `Vec<String>` and do no I/O; `print_*` wrappers
//! write them to stdout.

use crate::generate::GenerationSummary;
use crate::report::MissingPropertyReport;
use crate::scan::{FileEntry, to_slash};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Environment label of a filter: relative directory plus stem (`eu/prod`).
fn filter_label(filter: &FileEntry) -> String {
    if filter.relative_dir.is_empty() {
        filter.stem.clone()
    } else {
        format!("{}/{}", filter.relative_dir, filter.stem)
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Filters with their contributing files.
pub fn format_filters(filters: &[FileEntry]) -> Vec<String> {
    let mut lines = vec!["Filters".to_string()];
    for (i, filter) in filters.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), filter_label(filter)));
        lines.push(format!("{}Source: {}", indent(1), filter.relative_path()));
        for overlay in &filter.overlays {
            lines.push(format!("{}Overlay: {}", indent(1), to_slash(overlay)));
        }
    }
    lines
}

/// The aggregated missing-property report, one line per filter.
pub fn format_missing(report: &MissingPropertyReport) -> Vec<String> {
    if report.is_empty() {
        return Vec::new();
    }
    let mut lines = vec!["Missing properties".to_string()];
    for (filter, keys) in report.iter() {
        let joined: Vec<&str> = keys.iter().map(String::as_str).collect();
        lines.push(format!("{}{}: {}", indent(1), filter, joined.join(", ")));
    }
    lines
}

/// Full output of a `generate` run.
pub fn format_generate_output(summary: &GenerationSummary, output_base: &Path) -> Vec<String> {
    let mut lines = format_filters(&summary.filters);

    lines.push(String::new());
    lines.push("Generated".to_string());
    let mut filter_index = 0;
    let mut current_filter: Option<&str> = None;
    for file in &summary.generated {
        if current_filter != Some(file.filter.as_str()) {
            filter_index += 1;
            current_filter = Some(file.filter.as_str());
            let label = summary
                .filters
                .iter()
                .find(|f| f.relative_path() == file.filter)
                .map(filter_label)
                .unwrap_or_else(|| file.filter.clone());
            lines.push(format!("{} {}", format_index(filter_index), label));
        }
        let shown = file.output.strip_prefix(output_base).unwrap_or(&file.output);
        lines.push(format!(
            "{}{} → {}",
            indent(1),
            file.template,
            to_slash(shown)
        ));
    }

    let missing = format_missing(&summary.missing);
    if !missing.is_empty() {
        lines.push(String::new());
        lines.extend(missing);
    }

    lines.push(String::new());
    lines.push(format!(
        "Generated {} from {} × {}",
        plural(summary.generated.len(), "file"),
        plural(summary.filters.len(), "filter"),
        plural(summary.templates.len(), "template"),
    ));
    lines
}

/// Output of a `check` run: filters, any missing properties and a count.
pub fn format_check_output(summary: &GenerationSummary) -> Vec<String> {
    let mut lines = format_filters(&summary.filters);
    let missing = format_missing(&summary.missing);
    if !missing.is_empty() {
        lines.push(String::new());
        lines.extend(missing);
    }
    lines.push(String::new());
    lines.push(format!(
        "Checked {} × {}",
        plural(summary.filters.len(), "filter"),
        plural(summary.templates.len(), "template"),
    ));
    lines
}

pub fn print_generate_output(summary: &GenerationSummary, output_base: &Path) {
    for line in format_generate_output(summary, output_base) {
        println!("{}", line);
    }
}

pub fn print_check_output(summary: &GenerationSummary) {
    for line in format_check_output(summary) {
        println!("{}", line);
    }
}
