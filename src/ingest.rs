use std::path::Path;

use crate::error::Result;
use crate::model::CoverageModel;
use crate::parser;

/// Read a tracefile from disk and parse it into a coverage model.
///
/// The file is read fully into memory up front; the parser itself never
/// touches the filesystem.
pub fn parse_file(path: &Path, title: Option<&str>) -> Result<CoverageModel> {
    let content = std::fs::read_to_string(path)?;
    parser::parse(&content, title)
}
