use std::path::PathBuf;

use vocab_lib::consistency::{ValidationIssue, ValidationReport};

/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
}

pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

fn render_issue(issue: &ValidationIssue, color: &str, use_color: bool) -> Vec<String> {
    let mut lines = vec![
        format!("  {}", paint(&format!("{}: {}", issue.file, issue.location), color, use_color)),
        format!("    {}", issue.message),
    ];
    for suggestion in &issue.suggestions {
        lines.push(format!("    {}", paint(&format!("hint: {}", suggestion), Color::DIM, use_color)));
    }
    lines
}

/// Render a report grouped by bucket, followed by a summary line
pub fn render_report(report: &ValidationReport, use_color: bool) -> String {
    let sections = [
        ("Ledger structure", &report.structure_errors, Color::RED),
        ("Cross-reference consistency", &report.consistency_errors, Color::RED),
        ("Warnings", &report.warnings, Color::YELLOW),
    ];

    let mut lines = Vec::new();
    for (title, issues, color) in sections {
        if issues.is_empty() {
            continue;
        }
        lines.push(paint(&format!("{} ({})", title, issues.len()), Color::BOLD, use_color));
        for issue in issues {
            lines.extend(render_issue(issue, color, use_color));
        }
        lines.push(String::new());
    }

    if report.is_clean() {
        lines.push(paint("No issues found", Color::GREEN, use_color));
    } else {
        lines.push(format!(
            "{} errors, {} warnings",
            report.error_count(),
            report.warnings.len()
        ));
    }
    lines.join("\n")
}

pub fn render_written(paths: &[PathBuf], use_color: bool) -> String {
    if paths.is_empty() {
        return paint("No files changed", Color::DIM, use_color);
    }
    let mut lines = vec![format!("Wrote {} files:", paths.len())];
    for path in paths {
        lines.push(format!("  {}", paint(&path.display().to_string(), Color::CYAN, use_color)));
    }
    lines.join("\n")
}
