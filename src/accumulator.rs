//! Mutable per-file builder feeding the immutable [`FileSnapshot`].
//!
//! One accumulator lives for exactly one file block: it is created on `SF:`,
//! fed detail records, and consumed by [`FileAccumulator::finalize`] when the
//! block ends. The staged function maps exist only to correlate the two-phase
//! `FN:`/`FNDA:` wire declaration and are discarded at finalize.

use std::collections::HashMap;

use crate::error::{Metric, Result, TracecovError};
use crate::model::FileSnapshot;
use crate::record::{BranchRecord, FunctionData, FunctionDef, FunctionRecord, LineRecord};

/// Builder for one file block's coverage data.
#[derive(Debug)]
pub struct FileAccumulator {
    path: String,
    lines: Vec<LineRecord>,
    branches: Vec<BranchRecord>,
    /// Function definition sites, joined with hits by name at finalize.
    function_defs: Vec<FunctionDef>,
    /// Execution counts keyed by function name. Names are unique per file
    /// in this format; a repeated FNDA overwrites (last value wins).
    function_hits: HashMap<String, u64>,
    declared_lines_found: Option<u64>,
    declared_lines_hit: Option<u64>,
    declared_functions_found: Option<u64>,
    declared_functions_hit: Option<u64>,
    declared_branches_found: Option<u64>,
    declared_branches_hit: Option<u64>,
}

impl FileAccumulator {
    pub fn new(path: String) -> Self {
        Self {
            path,
            lines: Vec::new(),
            branches: Vec::new(),
            function_defs: Vec::new(),
            function_hits: HashMap::new(),
            declared_lines_found: None,
            declared_lines_hit: None,
            declared_functions_found: None,
            declared_functions_hit: None,
            declared_branches_found: None,
            declared_branches_hit: None,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decode and append a `DA:` record. `line_number` is the physical
    /// position in the tracefile, used to tag decode failures.
    pub fn add_line(&mut self, text: &str, line_number: usize) -> Result<()> {
        let record = LineRecord::decode(text).map_err(|e| e.at_line(line_number))?;
        self.lines.push(record);
        Ok(())
    }

    /// Decode and append a `BRDA:` record.
    pub fn add_branch(&mut self, text: &str, line_number: usize) -> Result<()> {
        let record = BranchRecord::decode(text).map_err(|e| e.at_line(line_number))?;
        self.branches.push(record);
        Ok(())
    }

    /// Decode and stage an `FN:` record for finalize-time correlation.
    pub fn add_function_def(&mut self, text: &str, line_number: usize) -> Result<()> {
        let def = FunctionDef::decode(text).map_err(|e| e.at_line(line_number))?;
        self.function_defs.push(def);
        Ok(())
    }

    /// Decode and stage an `FNDA:` record for finalize-time correlation.
    pub fn add_function_hit(&mut self, text: &str, line_number: usize) -> Result<()> {
        let data = FunctionData::decode(text).map_err(|e| e.at_line(line_number))?;
        self.function_hits.insert(data.name, data.hit_count);
        Ok(())
    }

    pub fn set_lines_found(&mut self, count: u64) {
        self.declared_lines_found = Some(count);
    }

    pub fn set_lines_hit(&mut self, count: u64) {
        self.declared_lines_hit = Some(count);
    }

    pub fn set_functions_found(&mut self, count: u64) {
        self.declared_functions_found = Some(count);
    }

    pub fn set_functions_hit(&mut self, count: u64) {
        self.declared_functions_hit = Some(count);
    }

    pub fn set_branches_found(&mut self, count: u64) {
        self.declared_branches_found = Some(count);
    }

    pub fn set_branches_hit(&mut self, count: u64) {
        self.declared_branches_hit = Some(count);
    }

    /// Produce the immutable snapshot and cross-check declared totals.
    ///
    /// Records are stably sorted by source line number, so entries sharing a
    /// line keep their input order. Function definitions are joined with hit
    /// data by name: a definition with no hit record gets count 0, while a
    /// hit record naming an undefined function is silently dropped.
    pub fn finalize(self) -> Result<FileSnapshot> {
        let Self {
            path,
            mut lines,
            mut branches,
            mut function_defs,
            function_hits,
            declared_lines_found,
            declared_lines_hit,
            declared_functions_found,
            declared_functions_hit,
            declared_branches_found,
            declared_branches_hit,
        } = self;

        lines.sort_by_key(|r| r.line_number);
        branches.sort_by_key(|r| r.line_number);
        function_defs.sort_by_key(|d| d.line_number);

        let functions = function_defs
            .into_iter()
            .map(|def| {
                let hit_count = function_hits.get(&def.name).copied().unwrap_or(0);
                FunctionRecord {
                    line_number: def.line_number,
                    name: def.name,
                    hit_count,
                }
            })
            .collect();

        let snapshot = FileSnapshot {
            path,
            lines,
            functions,
            branches,
        };

        let mut checks = vec![
            (
                Metric::LinesFound,
                declared_lines_found,
                snapshot.lines_found(),
            ),
            (Metric::LinesHit, declared_lines_hit, snapshot.lines_hit()),
            (
                Metric::FunctionsFound,
                declared_functions_found,
                snapshot.functions_found(),
            ),
            (
                Metric::FunctionsHit,
                declared_functions_hit,
                snapshot.functions_hit(),
            ),
        ];

        // Declared-only branch reporting: when a tracefile carries BRF/BRH
        // but no BRDA detail at all, accept the totals unverified.
        if !snapshot.branches.is_empty() {
            checks.push((
                Metric::BranchesFound,
                declared_branches_found,
                snapshot.branches_found(),
            ));
            checks.push((
                Metric::BranchesHit,
                declared_branches_hit,
                snapshot.branches_hit(),
            ));
        }

        for (metric, declared, observed) in checks {
            if let Some(expected) = declared {
                if expected != observed {
                    return Err(TracecovError::CoverageCountMismatch {
                        path: snapshot.path.clone(),
                        metric,
                        expected,
                        observed,
                    });
                }
            }
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finalize_sorts_by_line_number() {
        let mut acc = FileAccumulator::new("src/lib.rs".to_string());
        acc.add_line("DA:3,1", 1).unwrap();
        acc.add_line("DA:1,5", 2).unwrap();
        acc.add_line("DA:2,0", 3).unwrap();

        let snapshot = acc.finalize().unwrap();
        let numbers: Vec<u32> = snapshot.lines.iter().map(|l| l.line_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_finalize_stable_for_duplicate_lines() {
        // Duplicate DA entries for one line are kept as-is, in input order.
        let mut acc = FileAccumulator::new("src/lib.rs".to_string());
        acc.add_line("DA:2,7", 1).unwrap();
        acc.add_line("DA:1,1", 2).unwrap();
        acc.add_line("DA:2,9", 3).unwrap();

        let snapshot = acc.finalize().unwrap();
        assert_eq!(snapshot.lines.len(), 3);
        assert_eq!(snapshot.lines[1].hit_count, 7);
        assert_eq!(snapshot.lines[2].hit_count, 9);
    }

    #[test]
    fn test_function_correlation() {
        let mut acc = FileAccumulator::new("src/lib.rs".to_string());
        acc.add_function_def("FN:10,helper", 1).unwrap();
        acc.add_function_def("FN:1,main", 2).unwrap();
        acc.add_function_hit("FNDA:5,main", 3).unwrap();

        let snapshot = acc.finalize().unwrap();
        assert_eq!(snapshot.functions.len(), 2);
        // Sorted by definition line.
        assert_eq!(snapshot.functions[0].name, "main");
        assert_eq!(snapshot.functions[0].hit_count, 5);
        // Definition with no hit record defaults to 0.
        assert_eq!(snapshot.functions[1].name, "helper");
        assert_eq!(snapshot.functions[1].hit_count, 0);
    }

    #[test]
    fn test_function_hit_without_def_is_dropped() {
        let mut acc = FileAccumulator::new("src/lib.rs".to_string());
        acc.add_function_hit("FNDA:5,phantom", 1).unwrap();

        let snapshot = acc.finalize().unwrap();
        assert!(snapshot.functions.is_empty());
    }

    #[test]
    fn test_malformed_record_carries_physical_line() {
        let mut acc = FileAccumulator::new("src/lib.rs".to_string());
        let err = acc.add_line("DA:1", 42).unwrap_err();
        match err {
            TracecovError::MalformedRecord { line_number, .. } => assert_eq!(line_number, 42),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_declared_totals_match() {
        let mut acc = FileAccumulator::new("src/lib.rs".to_string());
        acc.add_line("DA:1,0", 1).unwrap();
        acc.add_line("DA:2,3", 2).unwrap();
        acc.set_lines_found(2);
        acc.set_lines_hit(1);
        assert!(acc.finalize().is_ok());
    }

    #[test]
    fn test_declared_totals_mismatch() {
        let mut acc = FileAccumulator::new("a.dart".to_string());
        acc.add_line("DA:1,0", 1).unwrap();
        acc.add_line("DA:2,3", 2).unwrap();
        acc.set_lines_found(2);
        acc.set_lines_hit(2);

        let err = acc.finalize().unwrap_err();
        match err {
            TracecovError::CoverageCountMismatch {
                path,
                metric,
                expected,
                observed,
            } => {
                assert_eq!(path, "a.dart");
                assert_eq!(metric, Metric::LinesHit);
                assert_eq!(expected, 2);
                assert_eq!(observed, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_last_declared_value_wins() {
        let mut acc = FileAccumulator::new("src/lib.rs".to_string());
        acc.add_line("DA:1,1", 1).unwrap();
        acc.set_lines_found(7);
        acc.set_lines_found(1);
        assert!(acc.finalize().is_ok());
    }

    #[test]
    fn test_branch_checks_with_detail() {
        let mut acc = FileAccumulator::new("src/lib.rs".to_string());
        acc.add_branch("BRDA:4,0,0,2", 1).unwrap();
        acc.add_branch("BRDA:4,0,1,-", 2).unwrap();
        acc.set_branches_found(2);
        acc.set_branches_hit(2);

        let err = acc.finalize().unwrap_err();
        match err {
            TracecovError::CoverageCountMismatch {
                metric, observed, ..
            } => {
                assert_eq!(metric, Metric::BranchesHit);
                assert_eq!(observed, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_declared_only_branch_totals_unverified() {
        // BRF/BRH without any BRDA detail: accepted without cross-check.
        let mut acc = FileAccumulator::new("src/lib.rs".to_string());
        acc.add_line("DA:1,1", 1).unwrap();
        acc.set_branches_found(12);
        acc.set_branches_hit(9);
        assert!(acc.finalize().is_ok());
    }
}
