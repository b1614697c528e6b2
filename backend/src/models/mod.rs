//! Domain models shared by the ETL, training and serving stages.
//!
//! - [`MessageRecord`] - One cleaned message with its binary label vector
//! - [`Dataset`] - The cleaned table: ordered label names plus records
//! - [`TextColumn`] - Which text field feeds the classifier
//! - [`humanize_label`] - Display form of a label column name

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed (non-label) columns of the cleaned table, in storage order.
pub const MESSAGE_COLUMNS: [&str; 4] = ["id", "message", "original", "genre"];

// =============================================================================
// Message Record
// =============================================================================

/// A single cleaned message.
///
/// `labels[i]` is the 0/1 value of `Dataset::labels[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: i64,
    pub message: String,
    pub original: Option<String>,
    pub genre: String,
    pub labels: Vec<u8>,
}

impl MessageRecord {
    /// Text for the given column. Missing `original` falls back to `message`.
    pub fn text(&self, column: TextColumn) -> &str {
        match column {
            TextColumn::Message => &self.message,
            TextColumn::Original => self
                .original
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(&self.message),
        }
    }
}

/// Text field used as classifier input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TextColumn {
    #[default]
    Message,
    Original,
}

// =============================================================================
// Dataset
// =============================================================================

/// The cleaned wide table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Label column names, in column order.
    pub labels: Vec<String>,
    pub records: Vec<MessageRecord>,
}

impl Dataset {
    pub fn new(labels: Vec<String>, records: Vec<MessageRecord>) -> Self {
        Self { labels, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Message counts per genre, sorted by genre name.
    pub fn genre_counts(&self) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.genre.as_str()).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .map(|(genre, count)| (genre.to_string(), count))
            .collect()
    }

    /// Positive counts per label, sorted descending. Ties keep column order.
    pub fn label_counts(&self) -> Vec<(String, u64)> {
        let mut totals = vec![0u64; self.labels.len()];
        for record in &self.records {
            for (total, &value) in totals.iter_mut().zip(&record.labels) {
                *total += u64::from(value);
            }
        }

        let mut counts: Vec<(String, u64)> = self.labels.iter().cloned().zip(totals).collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    /// Classifier input texts, one per record.
    pub fn texts(&self, column: TextColumn) -> Vec<String> {
        self.records.iter().map(|r| r.text(column).to_string()).collect()
    }

    /// Label rows, one per record.
    pub fn label_rows(&self) -> Vec<Vec<u8>> {
        self.records.iter().map(|r| r.labels.clone()).collect()
    }

    /// Indices of labels whose value is identical for every record.
    pub fn constant_labels(&self) -> Vec<usize> {
        (0..self.labels.len())
            .filter(|&j| {
                let mut values = self.records.iter().map(|r| r.labels[j]);
                match values.next() {
                    Some(first) => values.all(|v| v == first),
                    None => true,
                }
            })
            .collect()
    }
}

/// Display form of a label: `medical_help` -> `Medical Help`.
pub fn humanize_label(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, genre: &str, labels: Vec<u8>) -> MessageRecord {
        MessageRecord {
            id,
            message: format!("message {}", id),
            original: None,
            genre: genre.to_string(),
            labels,
        }
    }

    fn sample() -> Dataset {
        Dataset::new(
            vec!["related".into(), "water".into(), "medical_help".into()],
            vec![
                record(1, "news", vec![1, 1, 0]),
                record(2, "direct", vec![1, 0, 1]),
                record(3, "news", vec![1, 1, 0]),
                record(4, "social", vec![0, 0, 0]),
            ],
        )
    }

    #[test]
    fn test_genre_counts_sorted_by_name() {
        let counts = sample().genre_counts();
        assert_eq!(
            counts,
            vec![
                ("direct".to_string(), 1),
                ("news".to_string(), 2),
                ("social".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_label_counts_descending_stable() {
        let counts = sample().label_counts();
        assert_eq!(counts[0], ("related".to_string(), 3));
        assert_eq!(counts[1], ("water".to_string(), 2));
        assert_eq!(counts[2], ("medical_help".to_string(), 1));
    }

    #[test]
    fn test_original_falls_back_to_message() {
        let mut r = record(7, "news", vec![]);
        assert_eq!(r.text(TextColumn::Original), "message 7");
        r.original = Some("mensaje".into());
        assert_eq!(r.text(TextColumn::Original), "mensaje");
        assert_eq!(r.text(TextColumn::Message), "message 7");
    }

    #[test]
    fn test_constant_labels() {
        let mut ds = sample();
        ds.records[3].labels[0] = 1;
        assert_eq!(ds.constant_labels(), vec![0]);
    }

    #[test]
    fn test_humanize_label() {
        assert_eq!(humanize_label("medical_help"), "Medical Help");
        assert_eq!(humanize_label("aid_related"), "Aid Related");
        assert_eq!(humanize_label("related"), "Related");
        assert_eq!(humanize_label("other_AID"), "Other Aid");
    }
}
