//! Wire records of the LCOV tracefile format.
//!
//! Reference: https://ltp.sourceforge.net/coverage/lcov/geninfo.1.php
//!
//! Each record occupies one physical line:
//!   TN:<test name>
//!   SF:<path to source file>
//!   FN:<line>,<function name>
//!   FNDA:<execution count>,<function name>
//!   FNF:<functions found>
//!   FNH:<functions hit>
//!   DA:<line number>,<execution count>
//!   BRDA:<line>,<block>,<branch>,<taken>   ("-" means never evaluated)
//!   BRF:<branches found>
//!   BRH:<branches hit>
//!   end_of_record
//!
//! Every decode takes the full trimmed line including its tag and is the
//! exact inverse of `encode`, with one exception: the BRDA "-" sentinel
//! decodes to a hit count of 0 and re-encodes as "0". A branch that was
//! evaluated zero times and one that was never evaluated are therefore
//! indistinguishable after a round trip, an accepted format ambiguity.

use serde::Serialize;

use crate::error::{Result, TracecovError};

/// The `end_of_record` sentinel closing a file block.
pub const END_OF_RECORD: &str = "end_of_record";

/// The token in a `BRDA:` hit field meaning the branch was never evaluated.
pub const NOT_EVALUATED: &str = "-";

fn malformed(text: &str, expected: &'static str) -> TracecovError {
    TracecovError::MalformedRecord {
        line_number: 0,
        text: text.to_string(),
        expected,
    }
}

/// Strip a required `TAG:` prefix from a trimmed line.
fn strip_tag<'a>(line: &'a str, tag: &str, expected: &'static str) -> Result<&'a str> {
    line.strip_prefix(tag)
        .and_then(|rest| rest.strip_prefix(':'))
        .ok_or_else(|| malformed(line, expected))
}

fn parse_number<T: std::str::FromStr>(
    field: &str,
    line: &str,
    expected: &'static str,
) -> Result<T> {
    field.parse().map_err(|_| malformed(line, expected))
}

/// A single executable line and how often it was hit (`DA:`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineRecord {
    pub line_number: u32,
    pub hit_count: u64,
}

impl LineRecord {
    const EXPECTED: &str = "DA:<line>,<hits>";

    pub fn decode(line: &str) -> Result<Self> {
        let value = strip_tag(line, "DA", Self::EXPECTED)?;
        let parts: Vec<&str> = value.split(',').collect();
        if parts.len() != 2 {
            return Err(malformed(line, Self::EXPECTED));
        }
        Ok(Self {
            line_number: parse_number(parts[0], line, Self::EXPECTED)?,
            hit_count: parse_number(parts[1], line, Self::EXPECTED)?,
        })
    }

    #[must_use]
    pub fn encode(&self) -> String {
        format!("DA:{},{}", self.line_number, self.hit_count)
    }
}

/// A function definition site (`FN:`). Carries no hit count; that arrives
/// separately as a [`FunctionData`] record correlated by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDef {
    pub line_number: u32,
    pub name: String,
}

impl FunctionDef {
    const EXPECTED: &str = "FN:<line>,<name>";

    pub fn decode(line: &str) -> Result<Self> {
        let value = strip_tag(line, "FN", Self::EXPECTED)?;
        let (line_str, name) = value
            .split_once(',')
            .ok_or_else(|| malformed(line, Self::EXPECTED))?;
        if name.is_empty() {
            return Err(malformed(line, Self::EXPECTED));
        }
        Ok(Self {
            line_number: parse_number(line_str, line, Self::EXPECTED)?,
            name: name.to_string(),
        })
    }

    #[must_use]
    pub fn encode(&self) -> String {
        format!("FN:{},{}", self.line_number, self.name)
    }
}

/// A function execution count (`FNDA:`), keyed by function name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionData {
    pub hit_count: u64,
    pub name: String,
}

impl FunctionData {
    const EXPECTED: &str = "FNDA:<hits>,<name>";

    pub fn decode(line: &str) -> Result<Self> {
        let value = strip_tag(line, "FNDA", Self::EXPECTED)?;
        let (count_str, name) = value
            .split_once(',')
            .ok_or_else(|| malformed(line, Self::EXPECTED))?;
        if name.is_empty() {
            return Err(malformed(line, Self::EXPECTED));
        }
        Ok(Self {
            hit_count: parse_number(count_str, line, Self::EXPECTED)?,
            name: name.to_string(),
        })
    }

    #[must_use]
    pub fn encode(&self) -> String {
        format!("FNDA:{},{}", self.hit_count, self.name)
    }
}

/// A fully-correlated function: definition site joined with its hit count.
/// Only produced by the accumulator at finalize time; it has no single wire
/// line of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionRecord {
    pub line_number: u32,
    pub name: String,
    pub hit_count: u64,
}

impl FunctionRecord {
    /// Re-encode as the `FN:`/`FNDA:` pair this record was joined from.
    #[must_use]
    pub fn encode(&self) -> (String, String) {
        let def = FunctionDef {
            line_number: self.line_number,
            name: self.name.clone(),
        };
        let data = FunctionData {
            hit_count: self.hit_count,
            name: self.name.clone(),
        };
        (def.encode(), data.encode())
    }
}

/// A single conditional branch outcome (`BRDA:`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchRecord {
    pub line_number: u32,
    pub block_number: u32,
    pub branch_number: u32,
    pub hit_count: u64,
}

impl BranchRecord {
    const EXPECTED: &str = "BRDA:<line>,<block>,<branch>,<hits|->";

    pub fn decode(line: &str) -> Result<Self> {
        let value = strip_tag(line, "BRDA", Self::EXPECTED)?;
        let parts: Vec<&str> = value.split(',').collect();
        if parts.len() != 4 {
            return Err(malformed(line, Self::EXPECTED));
        }
        let hit_count = if parts[3] == NOT_EVALUATED {
            0
        } else {
            parse_number(parts[3], line, Self::EXPECTED)?
        };
        Ok(Self {
            line_number: parse_number(parts[0], line, Self::EXPECTED)?,
            block_number: parse_number(parts[1], line, Self::EXPECTED)?,
            branch_number: parse_number(parts[2], line, Self::EXPECTED)?,
            hit_count,
        })
    }

    #[must_use]
    pub fn encode(&self) -> String {
        format!(
            "BRDA:{},{},{},{}",
            self.line_number, self.block_number, self.branch_number, self.hit_count
        )
    }
}

/// Decode the single count field of a declared-total record
/// (`LF: LH: FNF: FNH: BRF: BRH:`).
pub fn decode_count(line: &str, tag: &str) -> Result<u64> {
    const EXPECTED: &str = "<tag>:<count>";
    let value = strip_tag(line, tag, EXPECTED)?;
    parse_number(value, line, EXPECTED)
}
