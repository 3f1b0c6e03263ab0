use thiserror::Error;

/// The coverage metric a declared total refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    LinesFound,
    LinesHit,
    FunctionsFound,
    FunctionsHit,
    BranchesFound,
    BranchesHit,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::LinesFound => "lines found",
            Metric::LinesHit => "lines hit",
            Metric::FunctionsFound => "functions found",
            Metric::FunctionsHit => "functions hit",
            Metric::BranchesFound => "branches found",
            Metric::BranchesHit => "branches hit",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum TracecovError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record at line {line_number}: '{text}' (expected {expected})")]
    MalformedRecord {
        line_number: usize,
        text: String,
        expected: &'static str,
    },

    #[error("record out of order at line {line_number}: '{tag}' before any SF: record")]
    RecordOutOfOrder { line_number: usize, tag: String },

    #[error("coverage count mismatch in {path}: {metric} declared {expected} but observed {observed}")]
    CoverageCountMismatch {
        path: String,
        metric: Metric,
        expected: u64,
        observed: u64,
    },

    #[error("structural format error: {0}")]
    StructuralFormat(String),

    #[error("invalid path pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl TracecovError {
    /// Attach a physical line number to a record decode failure. Decoding is
    /// pure and line-agnostic; the caller that knows the position tags it.
    pub(crate) fn at_line(self, line_number: usize) -> Self {
        match self {
            TracecovError::MalformedRecord { text, expected, .. } => {
                TracecovError::MalformedRecord {
                    line_number,
                    text,
                    expected,
                }
            }
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, TracecovError>;
