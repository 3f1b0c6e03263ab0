//! Plain-text rendering of a coverage model.
//!
//! Each renderer returns its output as a `String`, making it easy to test
//! without capturing stdout. HTML generation is deliberately not part of
//! this crate.

use std::fmt::Write;

use crate::model::{CoverageModel, FileSnapshot, ValidationIssue};

/// Render the whole-project summary block.
#[must_use]
pub fn format_summary(model: &CoverageModel) -> String {
    let mut out = String::new();

    if let Some(title) = &model.title {
        writeln!(out, "Title:      {title}").unwrap();
    }
    writeln!(
        out,
        "Generated:  {}",
        model.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
    .unwrap();
    writeln!(out, "Files:      {}", model.summary.total_files).unwrap();
    writeln!(
        out,
        "Lines:      {}/{} ({:.1}%)",
        model.summary.lines_hit,
        model.summary.lines_found,
        model.summary.line_percent()
    )
    .unwrap();
    if model.summary.functions_found > 0 {
        writeln!(
            out,
            "Functions:  {}/{} ({:.1}%)",
            model.summary.functions_hit,
            model.summary.functions_found,
            model.summary.function_percent()
        )
        .unwrap();
    }
    if model.summary.branches_found > 0 {
        writeln!(
            out,
            "Branches:   {}/{} ({:.1}%)",
            model.summary.branches_hit,
            model.summary.branches_found,
            model.summary.branch_percent()
        )
        .unwrap();
    }
    writeln!(out, "Overall:    {:.1}%", model.summary.overall_percent()).unwrap();

    out
}

/// Render a per-file table for the given snapshots.
#[must_use]
pub fn format_files_table(files: &[&FileSnapshot]) -> String {
    let mut out = String::new();
    writeln!(
        out,
        "{:<60} {:>8} {:>8} {:>8}",
        "FILE", "LINES", "COVERED", "RATE"
    )
    .unwrap();
    writeln!(out, "{}", "-".repeat(88)).unwrap();

    for f in files {
        writeln!(
            out,
            "{:<60} {:>8} {:>8} {:>7.1}%",
            f.path,
            f.lines_found(),
            f.lines_hit(),
            f.line_percent()
        )
        .unwrap();
    }

    out
}

/// Render line-level detail for one snapshot.
#[must_use]
pub fn format_lines(file: &FileSnapshot) -> String {
    let mut out = String::new();
    writeln!(out, "{:>6}  {:>10}", "LINE", "HITS").unwrap();
    writeln!(out, "{}", "-".repeat(18)).unwrap();
    for line in &file.lines {
        let marker = if line.hit_count > 0 { "✓" } else { "✗" };
        writeln!(
            out,
            "{:>6}  {:>10}  {}",
            line.line_number, line.hit_count, marker
        )
        .unwrap();
    }
    out
}

/// Render the uncovered lines of one snapshot in compact range notation.
#[must_use]
pub fn format_uncovered(file: &FileSnapshot) -> String {
    let uncovered = file.uncovered_lines();
    if uncovered.is_empty() {
        return format!("All instrumentable lines are covered in '{}'\n", file.path);
    }

    let mut out = String::new();
    writeln!(out, "Uncovered lines in '{}':", file.path).unwrap();
    writeln!(out, "  {}", format_line_ranges(&uncovered)).unwrap();
    writeln!(out, "  ({} lines)", uncovered.len()).unwrap();
    out
}

/// Render per-function coverage for one snapshot.
#[must_use]
pub fn format_functions(file: &FileSnapshot) -> String {
    let mut out = String::new();
    writeln!(out, "{:>6}  {:>10}  NAME", "LINE", "HITS").unwrap();
    writeln!(out, "{}", "-".repeat(30)).unwrap();
    for func in &file.functions {
        writeln!(
            out,
            "{:>6}  {:>10}  {}",
            func.line_number, func.hit_count, func.name
        )
        .unwrap();
    }
    out
}

/// Render validation findings, one per line.
#[must_use]
pub fn format_validation(issues: &[ValidationIssue]) -> String {
    if issues.is_empty() {
        return "No structural problems found.\n".to_string();
    }
    let mut out = String::new();
    for issue in issues {
        writeln!(out, "{issue}").unwrap();
    }
    out
}

/// Format sorted line numbers into compact range notation, e.g. "1, 3-5, 8".
#[must_use]
pub fn format_line_ranges(lines: &[u32]) -> String {
    if lines.is_empty() {
        return String::new();
    }

    let mut ranges: Vec<(u32, u32)> = Vec::new();
    let mut start = lines[0];
    let mut end = lines[0];

    for &line in &lines[1..] {
        if line == end + 1 {
            end = line;
        } else {
            ranges.push((start, end));
            start = line;
            end = line;
        }
    }
    ranges.push((start, end));

    ranges
        .iter()
        .map(|&(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{start}-{end}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
