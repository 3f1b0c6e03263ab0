//! Uniform in-memory representation of parsed coverage data. The parser
//! produces a [`CoverageModel`] which is the sole artifact handed to
//! rendering and reporting code.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;

use crate::error::Result;
use crate::record::{BranchRecord, FunctionRecord, LineRecord};

/// Compute a coverage percentage. A zero total yields 100.0 so that files
/// with, say, no branches don't drag down overall coverage.
#[must_use]
pub fn percent(covered: u64, total: u64) -> f64 {
    if total == 0 {
        100.0
    } else {
        covered as f64 / total as f64 * 100.0
    }
}

/// Immutable coverage data for a single source file. Built only by the
/// accumulator; all metrics are derived on demand from the record lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSnapshot {
    pub path: String,
    pub lines: Vec<LineRecord>,
    pub functions: Vec<FunctionRecord>,
    pub branches: Vec<BranchRecord>,
}

impl FileSnapshot {
    #[must_use]
    pub fn lines_found(&self) -> u64 {
        self.lines.len() as u64
    }

    #[must_use]
    pub fn lines_hit(&self) -> u64 {
        self.lines.iter().filter(|l| l.hit_count > 0).count() as u64
    }

    #[must_use]
    pub fn functions_found(&self) -> u64 {
        self.functions.len() as u64
    }

    #[must_use]
    pub fn functions_hit(&self) -> u64 {
        self.functions.iter().filter(|f| f.hit_count > 0).count() as u64
    }

    #[must_use]
    pub fn branches_found(&self) -> u64 {
        self.branches.len() as u64
    }

    #[must_use]
    pub fn branches_hit(&self) -> u64 {
        self.branches.iter().filter(|b| b.hit_count > 0).count() as u64
    }

    #[must_use]
    pub fn line_percent(&self) -> f64 {
        percent(self.lines_hit(), self.lines_found())
    }

    #[must_use]
    pub fn function_percent(&self) -> f64 {
        percent(self.functions_hit(), self.functions_found())
    }

    #[must_use]
    pub fn branch_percent(&self) -> f64 {
        percent(self.branches_hit(), self.branches_found())
    }

    /// Mean of the line/function/branch percentages, counting only the
    /// categories that actually have records. A file with no records at all
    /// is fully covered by the empty-denominator convention.
    #[must_use]
    pub fn overall_percent(&self) -> f64 {
        overall(
            (self.lines_hit(), self.lines_found()),
            (self.functions_hit(), self.functions_found()),
            (self.branches_hit(), self.branches_found()),
        )
    }

    /// Line numbers of instrumentable lines that were never hit, in order.
    #[must_use]
    pub fn uncovered_lines(&self) -> Vec<u32> {
        self.lines
            .iter()
            .filter(|l| l.hit_count == 0)
            .map(|l| l.line_number)
            .collect()
    }
}

fn overall(lines: (u64, u64), functions: (u64, u64), branches: (u64, u64)) -> f64 {
    let mut sum = 0.0;
    let mut categories = 0;
    for (hit, found) in [lines, functions, branches] {
        if found > 0 {
            sum += percent(hit, found);
            categories += 1;
        }
    }
    if categories == 0 {
        100.0
    } else {
        sum / categories as f64
    }
}

/// Aggregated totals across all files of a model. Always re-derived from
/// the snapshot list; never diverges from it in a valid model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoverageSummary {
    pub total_files: u64,
    pub lines_found: u64,
    pub lines_hit: u64,
    pub functions_found: u64,
    pub functions_hit: u64,
    pub branches_found: u64,
    pub branches_hit: u64,
}

impl CoverageSummary {
    /// Field-wise fold over the given snapshots.
    #[must_use]
    pub fn from_files(files: &[FileSnapshot]) -> Self {
        let mut summary = Self {
            total_files: files.len() as u64,
            ..Self::default()
        };
        for file in files {
            summary.lines_found += file.lines_found();
            summary.lines_hit += file.lines_hit();
            summary.functions_found += file.functions_found();
            summary.functions_hit += file.functions_hit();
            summary.branches_found += file.branches_found();
            summary.branches_hit += file.branches_hit();
        }
        summary
    }

    #[must_use]
    pub fn line_percent(&self) -> f64 {
        percent(self.lines_hit, self.lines_found)
    }

    #[must_use]
    pub fn function_percent(&self) -> f64 {
        percent(self.functions_hit, self.functions_found)
    }

    #[must_use]
    pub fn branch_percent(&self) -> f64 {
        percent(self.branches_hit, self.branches_found)
    }

    #[must_use]
    pub fn overall_percent(&self) -> f64 {
        overall(
            (self.lines_hit, self.lines_found),
            (self.functions_hit, self.functions_found),
            (self.branches_hit, self.branches_found),
        )
    }
}

/// A non-fatal structural problem reported by [`CoverageModel::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValidationIssue {
    /// Two file blocks declared the same source path.
    DuplicateFilePath { path: String },
    /// The stored summary no longer matches a recomputation from `files`.
    SummaryDivergence {
        field: &'static str,
        stored: u64,
        computed: u64,
    },
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationIssue::DuplicateFilePath { path } => {
                write!(f, "duplicate file path: {path}")
            }
            ValidationIssue::SummaryDivergence {
                field,
                stored,
                computed,
            } => {
                write!(
                    f,
                    "summary divergence in {field}: stored {stored}, computed {computed}"
                )
            }
        }
    }
}

/// The complete result of parsing one tracefile: per-file snapshots in
/// appearance order plus aggregated totals. Read-only after construction.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageModel {
    pub files: Vec<FileSnapshot>,
    pub summary: CoverageSummary,
    pub title: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl CoverageModel {
    /// Build a model from finished snapshots, computing the summary fold.
    #[must_use]
    pub fn from_files(files: Vec<FileSnapshot>, title: Option<String>) -> Self {
        let summary = CoverageSummary::from_files(&files);
        Self {
            files,
            summary,
            title,
            generated_at: Utc::now(),
        }
    }

    /// Look up a snapshot by source path.
    #[must_use]
    pub fn file(&self, path: &str) -> Option<&FileSnapshot> {
        self.files.iter().find(|f| f.path == path)
    }

    /// True when overall coverage meets the given percentage threshold.
    #[must_use]
    pub fn meets_threshold(&self, threshold: f64) -> bool {
        self.summary.overall_percent() >= threshold
    }

    /// Snapshots sorted ascending by overall coverage (worst first).
    #[must_use]
    pub fn sorted_by_coverage(&self) -> Vec<&FileSnapshot> {
        let mut sorted: Vec<&FileSnapshot> = self.files.iter().collect();
        sorted.sort_by(|a, b| a.overall_percent().total_cmp(&b.overall_percent()));
        sorted
    }

    /// Snapshots whose overall coverage is below the given threshold.
    #[must_use]
    pub fn below_threshold(&self, threshold: f64) -> Vec<&FileSnapshot> {
        self.files
            .iter()
            .filter(|f| f.overall_percent() < threshold)
            .collect()
    }

    /// Snapshots whose path matches the given regex pattern.
    pub fn matching(&self, pattern: &str) -> Result<Vec<&FileSnapshot>> {
        let re = Regex::new(pattern)?;
        Ok(self.files.iter().filter(|f| re.is_match(&f.path)).collect())
    }

    /// Report structural problems without failing: duplicate file paths and
    /// any divergence between the stored summary and a fresh recomputation.
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        let mut seen = std::collections::HashSet::new();
        for file in &self.files {
            if !seen.insert(file.path.as_str()) {
                issues.push(ValidationIssue::DuplicateFilePath {
                    path: file.path.clone(),
                });
            }
        }

        let computed = CoverageSummary::from_files(&self.files);
        let fields = [
            ("total files", self.summary.total_files, computed.total_files),
            ("lines found", self.summary.lines_found, computed.lines_found),
            ("lines hit", self.summary.lines_hit, computed.lines_hit),
            (
                "functions found",
                self.summary.functions_found,
                computed.functions_found,
            ),
            (
                "functions hit",
                self.summary.functions_hit,
                computed.functions_hit,
            ),
            (
                "branches found",
                self.summary.branches_found,
                computed.branches_found,
            ),
            (
                "branches hit",
                self.summary.branches_hit,
                computed.branches_hit,
            ),
        ];
        for (field, stored, value) in fields {
            if stored != value {
                issues.push(ValidationIssue::SummaryDivergence {
                    field,
                    stored,
                    computed: value,
                });
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(path: &str, lines: &[(u32, u64)]) -> FileSnapshot {
        FileSnapshot {
            path: path.to_string(),
            lines: lines
                .iter()
                .map(|&(line_number, hit_count)| LineRecord {
                    line_number,
                    hit_count,
                })
                .collect(),
            functions: vec![],
            branches: vec![],
        }
    }

    #[test]
    fn test_percent_empty_total() {
        assert_eq!(percent(0, 0), 100.0);
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 2), 50.0);
        assert_eq!(percent(0, 4), 0.0);
    }

    #[test]
    fn test_snapshot_derived_metrics() {
        let file = snapshot("src/lib.rs", &[(1, 5), (2, 0), (3, 1), (4, 0)]);
        assert_eq!(file.lines_found(), 4);
        assert_eq!(file.lines_hit(), 2);
        assert_eq!(file.line_percent(), 50.0);
        assert_eq!(file.uncovered_lines(), vec![2, 4]);
    }

    #[test]
    fn test_branch_percent_empty_is_100() {
        let file = snapshot("src/lib.rs", &[(1, 1)]);
        assert_eq!(file.branch_percent(), 100.0);
    }

    #[test]
    fn test_overall_averages_non_empty_categories() {
        let mut file = snapshot("src/lib.rs", &[(1, 1), (2, 0)]);
        file.functions = vec![FunctionRecord {
            line_number: 1,
            name: "main".to_string(),
            hit_count: 1,
        }];
        // Lines 50%, functions 100%, branches absent → (50 + 100) / 2.
        assert_eq!(file.overall_percent(), 75.0);
    }

    #[test]
    fn test_overall_no_records_is_100() {
        let file = snapshot("src/empty.rs", &[]);
        assert_eq!(file.overall_percent(), 100.0);
    }

    #[test]
    fn test_summary_fold() {
        let model = CoverageModel::from_files(
            vec![
                snapshot("a.rs", &[(1, 1), (2, 0)]),
                snapshot("b.rs", &[(1, 3)]),
            ],
            None,
        );
        assert_eq!(model.summary.total_files, 2);
        assert_eq!(model.summary.lines_found, 3);
        assert_eq!(model.summary.lines_hit, 2);
        assert_eq!(model.summary, CoverageSummary::from_files(&model.files));
    }

    #[test]
    fn test_derived_metrics_idempotent() {
        let model = CoverageModel::from_files(vec![snapshot("a.rs", &[(1, 1), (2, 0)])], None);
        assert_eq!(model.summary.line_percent(), model.summary.line_percent());
        assert_eq!(
            model.summary.overall_percent(),
            model.summary.overall_percent()
        );
        assert_eq!(model.meets_threshold(50.0), model.meets_threshold(50.0));
    }

    #[test]
    fn test_file_lookup() {
        let model = CoverageModel::from_files(vec![snapshot("a.rs", &[(1, 1)])], None);
        assert!(model.file("a.rs").is_some());
        assert!(model.file("b.rs").is_none());
    }

    #[test]
    fn test_sorted_by_coverage() {
        let model = CoverageModel::from_files(
            vec![
                snapshot("full.rs", &[(1, 1)]),
                snapshot("half.rs", &[(1, 1), (2, 0)]),
                snapshot("none.rs", &[(1, 0)]),
            ],
            None,
        );
        let sorted = model.sorted_by_coverage();
        let paths: Vec<&str> = sorted.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["none.rs", "half.rs", "full.rs"]);
    }

    #[test]
    fn test_below_threshold() {
        let model = CoverageModel::from_files(
            vec![
                snapshot("full.rs", &[(1, 1)]),
                snapshot("half.rs", &[(1, 1), (2, 0)]),
            ],
            None,
        );
        let below = model.below_threshold(80.0);
        assert_eq!(below.len(), 1);
        assert_eq!(below[0].path, "half.rs");
    }

    #[test]
    fn test_meets_threshold() {
        let model = CoverageModel::from_files(vec![snapshot("half.rs", &[(1, 1), (2, 0)])], None);
        assert!(model.meets_threshold(50.0));
        assert!(!model.meets_threshold(50.1));
    }

    #[test]
    fn test_matching() {
        let model = CoverageModel::from_files(
            vec![snapshot("src/a.rs", &[(1, 1)]), snapshot("lib/b.rs", &[])],
            None,
        );
        let matched = model.matching("^src/").unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].path, "src/a.rs");

        assert!(model.matching("[invalid").is_err());
    }

    #[test]
    fn test_validate_clean() {
        let model = CoverageModel::from_files(vec![snapshot("a.rs", &[(1, 1)])], None);
        assert!(model.validate().is_empty());
    }

    #[test]
    fn test_validate_duplicate_paths() {
        let model = CoverageModel::from_files(
            vec![snapshot("a.rs", &[(1, 1)]), snapshot("a.rs", &[(2, 0)])],
            None,
        );
        let issues = model.validate();
        assert!(issues.contains(&ValidationIssue::DuplicateFilePath {
            path: "a.rs".to_string()
        }));
    }

    #[test]
    fn test_validate_summary_divergence() {
        let mut model = CoverageModel::from_files(vec![snapshot("a.rs", &[(1, 1)])], None);
        model.summary.lines_hit = 99;
        let issues = model.validate();
        assert!(issues.iter().any(|i| matches!(
            i,
            ValidationIssue::SummaryDivergence {
                field: "lines hit",
                stored: 99,
                computed: 1,
            }
        )));
    }
}
