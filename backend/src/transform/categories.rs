//! Expansion of the semicolon-delimited category string.
//!
//! `related-1;request-0;offer-0` becomes the label names
//! `[related, request, offer]` and the values `[1, 0, 0]`. Names come from the
//! first row; every later row must list the same names in the same order.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CleanError, CleanResult};

static LABEL_CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\w+)-(\d)\s*$").expect("label cell pattern is valid"));

/// Label names plus one raw value row per input string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedLabels {
    pub names: Vec<String>,
    /// Raw digits, before normalization.
    pub values: Vec<Vec<u8>>,
}

/// Split one `name-digit` cell.
pub fn parse_cell(cell: &str) -> Option<(&str, u8)> {
    let caps = LABEL_CELL.captures(cell)?;
    let name = caps.get(1)?.as_str();
    let digit = caps.get(2)?.as_str().parse::<u8>().ok()?;
    Some((name, digit))
}

/// Expand category strings. `row` numbers in errors are 1-based.
pub fn expand_categories<'a, I>(rows: I) -> CleanResult<ExpandedLabels>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut names: Vec<String> = Vec::new();
    let mut values = Vec::new();

    for (idx, raw) in rows.into_iter().enumerate() {
        let row = idx + 1;
        let cells: Vec<&str> = raw.split(';').collect();

        if idx == 0 {
            for cell in &cells {
                let (name, _) = parse_cell(cell).ok_or_else(|| CleanError::MalformedCell {
                    row,
                    cell: cell.to_string(),
                })?;
                names.push(name.to_string());
            }
        } else if cells.len() != names.len() {
            return Err(CleanError::LabelCount {
                row,
                expected: names.len(),
                found: cells.len(),
            });
        }

        let mut row_values = Vec::with_capacity(names.len());
        for (cell, expected) in cells.iter().zip(&names) {
            let (name, value) = parse_cell(cell).ok_or_else(|| CleanError::MalformedCell {
                row,
                cell: cell.to_string(),
            })?;
            if name != expected {
                return Err(CleanError::LabelMismatch {
                    row,
                    expected: expected.clone(),
                    found: name.to_string(),
                });
            }
            row_values.push(value);
        }
        values.push(row_values);
    }

    Ok(ExpandedLabels { names, values })
}
