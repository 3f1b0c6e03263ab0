//! Single-pass parser turning tracefile text into a [`CoverageModel`].
//!
//! The parser is a two-state machine (idle / inside a file block) over
//! physical lines. Detail records are dispatched to the active
//! [`FileAccumulator`]; `end_of_record` finalizes it. A second `SF:` without
//! an intervening sentinel finalizes the previous block first, and end of
//! input finalizes any still-open block, so truncated tracefiles never lose
//! already-parsed files. Unknown record tags are skipped for forward
//! compatibility.
//!
//! Parsing fails fast on the first malformed record, out-of-order record, or
//! declared-total mismatch. A whole-input structural pre-check runs before
//! the state machine so that obviously-non-tracefile input is rejected with
//! one clear error instead of a cascade of out-of-order complaints.

use crate::accumulator::FileAccumulator;
use crate::error::{Result, TracecovError};
use crate::model::CoverageModel;
use crate::record::{decode_count, END_OF_RECORD};

/// Parse a complete tracefile into a coverage model.
///
/// `input` is the full trace text; `title` is an optional report title
/// carried through to the model. The parser operates purely on the string —
/// it has no knowledge of where the text came from.
pub fn parse(input: &str, title: Option<&str>) -> Result<CoverageModel> {
    precheck(input)?;

    let mut files = Vec::new();
    let mut current: Option<FileAccumulator> = None;

    for (index, raw) in input.lines().enumerate() {
        let line_number = index + 1;
        let line = raw.trim();

        if line.is_empty() {
            continue;
        }

        if line == END_OF_RECORD {
            if let Some(acc) = current.take() {
                files.push(acc.finalize()?);
            }
            continue;
        }

        let Some((tag, value)) = line.split_once(':') else {
            // Not a tagged record and not the sentinel: skip.
            continue;
        };

        match tag {
            "TN" => {
                // Test name, ignored.
            }
            "SF" => {
                // An unterminated previous block is finalized rather than
                // dropped.
                if let Some(acc) = current.take() {
                    files.push(acc.finalize()?);
                }
                current = Some(FileAccumulator::new(value.to_string()));
            }
            "DA" | "FN" | "FNDA" | "BRDA" | "LF" | "LH" | "FNF" | "FNH" | "BRF" | "BRH" => {
                let acc = current
                    .as_mut()
                    .ok_or_else(|| TracecovError::RecordOutOfOrder {
                        line_number,
                        tag: tag.to_string(),
                    })?;
                dispatch(acc, tag, line, line_number)?;
            }
            _ => {
                // Unknown record kind: skipped for forward compatibility.
            }
        }
    }

    // Missing trailing sentinel: finalize the open block as if one was seen.
    if let Some(acc) = current.take() {
        files.push(acc.finalize()?);
    }

    Ok(CoverageModel::from_files(
        files,
        title.map(|t| t.to_string()),
    ))
}

/// Forward one detail record to the active accumulator.
fn dispatch(acc: &mut FileAccumulator, tag: &str, line: &str, line_number: usize) -> Result<()> {
    let count = |tag| decode_count(line, tag).map_err(|e| e.at_line(line_number));
    match tag {
        "DA" => acc.add_line(line, line_number)?,
        "FN" => acc.add_function_def(line, line_number)?,
        "FNDA" => acc.add_function_hit(line, line_number)?,
        "BRDA" => acc.add_branch(line, line_number)?,
        "LF" => acc.set_lines_found(count("LF")?),
        "LH" => acc.set_lines_hit(count("LH")?),
        "FNF" => acc.set_functions_found(count("FNF")?),
        "FNH" => acc.set_functions_hit(count("FNH")?),
        "BRF" => acc.set_branches_found(count("BRF")?),
        "BRH" => acc.set_branches_hit(count("BRH")?),
        _ => unreachable!("dispatch called with unhandled tag {tag}"),
    }
    Ok(())
}

/// Whole-input structural sanity check: a tracefile must contain at least
/// one `SF:` record and at least one `end_of_record` sentinel somewhere.
fn precheck(input: &str) -> Result<()> {
    let mut has_file = false;
    let mut has_sentinel = false;

    for raw in input.lines() {
        let line = raw.trim();
        if line.starts_with("SF:") {
            has_file = true;
        } else if line == END_OF_RECORD {
            has_sentinel = true;
        }
        if has_file && has_sentinel {
            return Ok(());
        }
    }

    if !has_file {
        Err(TracecovError::StructuralFormat(
            "no SF: record found; input is not a tracefile".to_string(),
        ))
    } else {
        Err(TracecovError::StructuralFormat(
            "no end_of_record sentinel found".to_string(),
        ))
    }
}
