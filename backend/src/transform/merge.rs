//! Inner join of the messages and categories files on `id`.

use std::collections::HashMap;

use crate::parser::{RawCategories, RawMessage};

/// A message paired with its raw category string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRow {
    pub message: RawMessage,
    pub categories: String,
}

/// Join messages with categories on `id`.
///
/// Output follows message order. An id present several times in the
/// categories file yields one row per match; unmatched ids on either side
/// are dropped.
pub fn merge_on_id(messages: Vec<RawMessage>, categories: &[RawCategories]) -> Vec<MergedRow> {
    let mut by_id: HashMap<i64, Vec<&str>> = HashMap::new();
    for row in categories {
        by_id.entry(row.id).or_default().push(&row.categories);
    }

    let mut merged = Vec::with_capacity(messages.len());
    for message in messages {
        if let Some(matches) = by_id.get(&message.id) {
            for categories in matches {
                merged.push(MergedRow {
                    message: message.clone(),
                    categories: categories.to_string(),
                });
            }
        }
    }

    merged
}
