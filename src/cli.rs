//! Command handler functions for the tracecov CLI.
//!
//! Each `cmd_*` function returns its output as a `String`, making them easy
//! to test without capturing stdout.

use anyhow::Result;

use crate::model::CoverageModel;
use crate::report;

pub fn cmd_summary(model: &CoverageModel) -> Result<String> {
    Ok(report::format_summary(model))
}

pub fn cmd_files(
    model: &CoverageModel,
    sort_by_coverage: bool,
    below: Option<f64>,
    filter: Option<&str>,
) -> Result<String> {
    let mut files: Vec<_> = match filter {
        Some(pattern) => model.matching(pattern)?,
        None => model.files.iter().collect(),
    };

    if let Some(threshold) = below {
        files.retain(|f| f.overall_percent() < threshold);
    }

    if sort_by_coverage {
        files.sort_by(|a, b| a.overall_percent().total_cmp(&b.overall_percent()));
    }

    Ok(report::format_files_table(&files))
}

pub fn cmd_lines(model: &CoverageModel, source_file: &str, uncovered: bool) -> Result<String> {
    let file = model
        .file(source_file)
        .ok_or_else(|| anyhow::anyhow!("No coverage data for '{}'", source_file))?;

    if uncovered {
        Ok(report::format_uncovered(file))
    } else {
        Ok(report::format_lines(file))
    }
}

pub fn cmd_functions(model: &CoverageModel, source_file: &str) -> Result<String> {
    let file = model
        .file(source_file)
        .ok_or_else(|| anyhow::anyhow!("No coverage data for '{}'", source_file))?;
    Ok(report::format_functions(file))
}

pub fn cmd_validate(model: &CoverageModel) -> Result<String> {
    Ok(report::format_validation(&model.validate()))
}

pub fn cmd_json(model: &CoverageModel) -> Result<String> {
    let mut out = serde_json::to_string_pretty(model)?;
    out.push('\n');
    Ok(out)
}

/// Threshold gate. Returns the rendered verdict and whether the model passed.
pub fn cmd_check(model: &CoverageModel, threshold: f64) -> Result<(String, bool)> {
    let overall = model.summary.overall_percent();
    let passed = model.meets_threshold(threshold);
    let verdict = if passed { "PASS" } else { "FAIL" };
    Ok((
        format!("{verdict}: overall coverage {overall:.1}% (threshold {threshold:.1}%)\n"),
        passed,
    ))
}
