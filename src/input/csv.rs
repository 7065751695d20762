//! Reader for offline access-profile CSV files.
//!
//! Row layout (header row skipped):
//!
//! ```text
//! var_name, func_name, size, access, stride₁, pct₁, stride₂, pct₂, ...
//! ```
//!
//! Empty fields are dropped before positional reading, so trailing commas and
//! padding columns are harmless. Percentages are stored as 0–100 and turned
//! into fractions here. Malformed rows are logged and skipped; one bad row
//! never fails the whole file.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::warn;

use crate::error::InputError;
use crate::types::{AccessPattern, FunctionInfo, OperatorInfo, VariableInfo};

/// Minimum fields per row: variable, function, size, access.
const MIN_FIELDS: usize = 4;

/// Read and parse one profile file.
pub fn read_operator(name: &str, dataset: Option<&str>, path: &Path) -> Result<OperatorInfo, InputError> {
    let text = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_operator(name, dataset, &text)
}

/// Parse profile text into an operator, grouping rows by function.
///
/// Functions come out ordered by name; variables keep their row order.
pub fn parse_operator(name: &str, dataset: Option<&str>, text: &str) -> Result<OperatorInfo, InputError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.lines();

    if lines.next().is_none() {
        return Err(InputError::Empty(name.to_string()));
    }

    let mut by_function: BTreeMap<String, Vec<VariableInfo>> = BTreeMap::new();

    for (idx, line) in lines.enumerate() {
        // +2: 1-indexed, and the header was line 1
        let line_no = idx + 2;
        if line.trim().is_empty() {
            continue;
        }
        if let Some((func, var)) = parse_row(line, line_no) {
            by_function.entry(func).or_default().push(var);
        }
    }

    Ok(OperatorInfo {
        name: name.to_string(),
        dataset: dataset.map(str::to_string),
        functions: by_function
            .into_iter()
            .map(|(func, vars)| FunctionInfo::new(func, vars))
            .collect(),
    })
}

/// Parse one data row into (function name, variable).
fn parse_row(line: &str, line_no: usize) -> Option<(String, VariableInfo)> {
    let fields: Vec<&str> = line
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect();

    if fields.len() < MIN_FIELDS {
        warn!(line = line_no, "row has {} fields, need at least {}; skipping", fields.len(), MIN_FIELDS);
        return None;
    }

    let size = match fields[2].parse::<u64>() {
        Ok(v) => v,
        Err(e) => {
            warn!(line = line_no, "bad size '{}': {}; skipping row", fields[2], e);
            return None;
        }
    };
    let access = match fields[3].parse::<u64>() {
        Ok(v) => v,
        Err(e) => {
            warn!(line = line_no, "bad access count '{}': {}; skipping row", fields[3], e);
            return None;
        }
    };

    let var = VariableInfo::new(fields[0], size, access, parse_patterns(&fields[MIN_FIELDS..], line_no));
    Some((fields[1].to_string(), var))
}

/// Read (stride, percent) pairs until the first one that fails to parse.
/// A dangling odd field at the end is ignored.
fn parse_patterns(fields: &[&str], line_no: usize) -> Vec<AccessPattern> {
    let mut patterns = Vec::with_capacity(fields.len() / 2);

    for pair in fields.chunks_exact(2) {
        let stride = pair[0].parse::<i32>();
        let percent = pair[1].parse::<f64>();
        match (stride, percent) {
            (Ok(stride), Ok(percent)) if percent.is_finite() && percent >= 0.0 => {
                patterns.push(AccessPattern::new(stride, percent / 100.0))
            }
            _ => {
                warn!(line = line_no, "bad stride/percent pair '{},{}'; ignoring rest of row", pair[0], pair[1]);
                break;
            }
        }
    }

    patterns
}
