//! Invariant checks for the cleaned table.
//!
//! Run by the ETL after cleaning and before anything touches the database:
//!
//! - at least one label column, names unique and usable as SQL identifiers
//! - no label named like a message column (`id`, `message`, `original`, `genre`)
//! - every record has one value per label, each value in {0, 1}
//! - no duplicate rows
//!
//! # Example
//!
//! ```rust,ignore
//! use disaster_response::validation::validate_dataset;
//!
//! if let Err(errors) = validate_dataset(&dataset) {
//!     for e in errors { eprintln!("{}", e); }
//! }
//! ```

use std::collections::HashSet;

use crate::models::{Dataset, MESSAGE_COLUMNS};

/// Maximum number of per-record errors collected before stopping.
const MAX_RECORD_ERRORS: usize = 10;

/// Whether `name` can be used as a column name.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Check label names only.
///
/// Column names are compared ignoring ASCII case, as SQLite does.
pub fn validate_labels(labels: &[String]) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if labels.is_empty() {
        errors.push("Dataset has no label columns".to_string());
    }

    let mut seen = HashSet::new();
    for name in labels {
        if !is_valid_identifier(name) {
            errors.push(format!("Label '{}' is not a valid column name", name));
        }
        if MESSAGE_COLUMNS.iter().any(|c| c.eq_ignore_ascii_case(name)) {
            errors.push(format!("Label '{}' collides with a message column", name));
        }
        if !seen.insert(name.to_ascii_lowercase()) {
            errors.push(format!("Label '{}' appears more than once", name));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check every invariant of the cleaned table.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with the errors found
pub fn validate_dataset(dataset: &Dataset) -> Result<(), Vec<String>> {
    let mut errors = validate_labels(&dataset.labels).err().unwrap_or_default();
    let mut record_errors = 0;
    let mut seen = HashSet::with_capacity(dataset.len());

    for (i, record) in dataset.records.iter().enumerate() {
        if record_errors >= MAX_RECORD_ERRORS {
            errors.push("Too many invalid records, stopping".to_string());
            break;
        }

        if record.labels.len() != dataset.labels.len() {
            errors.push(format!(
                "Record {} (id {}): {} label values for {} labels",
                i,
                record.id,
                record.labels.len(),
                dataset.labels.len()
            ));
            record_errors += 1;
        }

        if let Some((j, value)) = record.labels.iter().enumerate().find(|&(_, &v)| v > 1) {
            let name = dataset.labels.get(j).map(String::as_str).unwrap_or("?");
            errors.push(format!(
                "Record {} (id {}): label '{}' = {}, expected 0 or 1",
                i, record.id, name, value
            ));
            record_errors += 1;
        }

        if !seen.insert(record) {
            errors.push(format!("Record {} (id {}) is a duplicate", i, record.id));
            record_errors += 1;
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick check: returns just true/false.
pub fn is_valid(dataset: &Dataset) -> bool {
    validate_dataset(dataset).is_ok()
}
