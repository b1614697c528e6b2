//! Cleaning of merged rows into the final [`Dataset`].
//!
//! Label value `2` is a known quirk of the source data (every such row has
//! all other labels at 0) and is mapped to `0`. Normalization runs before
//! duplicate removal so the output never holds two rows that only differed by
//! a `2`.

use std::collections::HashSet;

use super::categories::expand_categories;
use super::merge::MergedRow;
use crate::error::{CleanError, CleanResult};
use crate::models::{Dataset, MessageRecord};

/// Counters reported by [`clean`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanStats {
    pub input_rows: usize,
    pub duplicates_removed: usize,
    pub normalized_values: usize,
}

/// Expand labels, normalize `2` to `0` and drop duplicate rows.
///
/// The first occurrence of a duplicate is kept; row order is preserved.
pub fn clean(merged: Vec<MergedRow>) -> CleanResult<(Dataset, CleanStats)> {
    if merged.is_empty() {
        return Err(CleanError::EmptyInput);
    }

    let expanded = expand_categories(merged.iter().map(|r| r.categories.as_str()))?;
    let mut stats = CleanStats {
        input_rows: merged.len(),
        ..CleanStats::default()
    };

    let mut seen: HashSet<MessageRecord> = HashSet::with_capacity(merged.len());
    let mut records = Vec::with_capacity(merged.len());

    for (idx, (row, mut labels)) in merged.into_iter().zip(expanded.values).enumerate() {
        for (value, name) in labels.iter_mut().zip(&expanded.names) {
            match *value {
                0 | 1 => {}
                2 => {
                    *value = 0;
                    stats.normalized_values += 1;
                }
                other => {
                    return Err(CleanError::UnsupportedValue {
                        row: idx + 1,
                        label: name.clone(),
                        value: other,
                    })
                }
            }
        }

        let record = MessageRecord {
            id: row.message.id,
            message: row.message.message,
            original: row.message.original,
            genre: row.message.genre,
            labels,
        };

        if seen.contains(&record) {
            stats.duplicates_removed += 1;
        } else {
            seen.insert(record.clone());
            records.push(record);
        }
    }

    Ok((Dataset::new(expanded.names, records), stats))
}
