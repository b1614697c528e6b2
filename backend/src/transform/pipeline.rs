//! High-level ETL API: load, clean, validate and store in one call.
//!
//! # Example
//!
//! ```rust,ignore
//! use disaster_response::transform::{run_etl, EtlOptions};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let summary = run_etl(
//!         Path::new("disaster_messages.csv"),
//!         Path::new("disaster_categories.csv"),
//!         Path::new("DisasterResponse.db"),
//!         EtlOptions::default(),
//!     ).await?;
//!
//!     println!("Stored {} rows", summary.rows_written);
//!     Ok(())
//! }
//! ```

use serde::Serialize;
use std::path::Path;

use super::clean::{clean, CleanStats};
use super::merge::merge_on_id;
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::error::{EtlError, EtlResult};
use crate::models::Dataset;
use crate::parser::{load_categories, load_messages, RawCategories, RawMessage};
use crate::store::{DatasetStore, DEFAULT_TABLE};
use crate::validation::validate_dataset;

/// Options for the ETL run
#[derive(Debug, Clone)]
pub struct EtlOptions {
    /// Destination table
    pub table: String,
}

impl Default for EtlOptions {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

/// What an ETL run read, changed and wrote
#[derive(Debug, Clone, Serialize)]
pub struct EtlSummary {
    pub messages_read: usize,
    pub categories_read: usize,
    pub merged_rows: usize,
    pub duplicates_removed: usize,
    pub normalized_values: usize,
    pub rows_written: usize,
    pub labels: Vec<String>,
}

/// Merge, clean and validate already-loaded inputs. Pure; touches no files.
pub fn clean_inputs(
    messages: Vec<RawMessage>,
    categories: &[RawCategories],
) -> EtlResult<(Dataset, CleanStats)> {
    let merged = merge_on_id(messages, categories);
    let (dataset, stats) = clean(merged)?;
    validate_dataset(&dataset).map_err(EtlError::Validation)?;
    Ok((dataset, stats))
}

/// Run the full ETL.
///
/// The destination table is only touched once loading, cleaning and
/// validation have all succeeded.
pub async fn run_etl(
    messages_path: &Path,
    categories_path: &Path,
    database: &Path,
    options: EtlOptions,
) -> EtlResult<EtlSummary> {
    log_info("Loading data...");
    log_info_indent(format!("MESSAGES: {}", messages_path.display()), 1);
    log_info_indent(format!("CATEGORIES: {}", categories_path.display()), 1);

    let messages = load_messages(messages_path)?;
    let categories = load_categories(categories_path)?;
    let messages_read = messages.len();
    let categories_read = categories.len();
    log_success(format!(
        "Read {} messages and {} category rows",
        messages_read, categories_read
    ));

    log_info("Cleaning data...");
    let (dataset, stats) = clean_inputs(messages, &categories)?;
    log_success(format!(
        "{} labels, {} merged rows, {} unique rows",
        dataset.labels.len(),
        stats.input_rows,
        dataset.len()
    ));
    if stats.duplicates_removed > 0 {
        log_info_indent(format!("Removed {} duplicate rows", stats.duplicates_removed), 1);
    }
    if stats.normalized_values > 0 {
        log_warning(format!(
            "Normalized {} label values of 2 to 0",
            stats.normalized_values
        ));
    }

    log_info("Saving data...");
    log_info_indent(format!("DATABASE: {}", database.display()), 1);
    let store = DatasetStore::create(database, &options.table).await?;
    let rows_written = store.save(&dataset).await?;
    store.close().await;
    log_success("Cleaned data saved to database!");

    Ok(EtlSummary {
        messages_read,
        categories_read,
        merged_rows: stats.input_rows,
        duplicates_removed: stats.duplicates_removed,
        normalized_values: stats.normalized_values,
        rows_written,
        labels: dataset.labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const MESSAGES: &str = "id,message,original,genre\n\
        2,\"Weather update - a cold front from Cuba that could pass over Haiti\",Un front froid,direct\n\
        7,Is the Hurricane over or is it not over,,direct\n\
        8,Looking for someone but no name,,direct\n\
        9,\"UN reports Leogane 80-90 destroyed, only hospital St Croix functioning\",,news\n";

    const CATEGORIES: &str = "id,categories\n\
        2,related-1;request-0;offer-0;medical_help-0\n\
        7,related-1;request-0;offer-0;medical_help-0\n\
        8,related-2;request-0;offer-0;medical_help-0\n\
        9,related-1;request-1;offer-0;medical_help-1\n\
        9,related-1;request-1;offer-0;medical_help-1\n";

    fn write_inputs(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
        let messages = dir.join("messages.csv");
        let categories = dir.join("categories.csv");
        fs::write(&messages, MESSAGES).unwrap();
        fs::write(&categories, CATEGORIES).unwrap();
        (messages, categories)
    }

    #[tokio::test]
    async fn test_run_etl_end_to_end() {
        let dir = tempdir().unwrap();
        let (messages, categories) = write_inputs(dir.path());
        let database = dir.path().join("DisasterResponse.db");

        let summary = run_etl(&messages, &categories, &database, EtlOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.messages_read, 4);
        assert_eq!(summary.merged_rows, 5);
        assert_eq!(summary.duplicates_removed, 1);
        assert_eq!(summary.normalized_values, 1);
        assert_eq!(summary.rows_written, 4);
        assert_eq!(summary.labels, vec!["related", "request", "offer", "medical_help"]);

        let store = DatasetStore::open(&database, DEFAULT_TABLE).await.unwrap();
        let loaded = store.load().await.unwrap();
        let row8 = loaded.records.iter().find(|r| r.id == 8).unwrap();
        assert_eq!(row8.labels, vec![0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_run_etl_is_idempotent() {
        let dir = tempdir().unwrap();
        let (messages, categories) = write_inputs(dir.path());
        let database = dir.path().join("idempotent.db");

        run_etl(&messages, &categories, &database, EtlOptions::default()).await.unwrap();
        let first = DatasetStore::open(&database, DEFAULT_TABLE).await.unwrap().load().await.unwrap();

        run_etl(&messages, &categories, &database, EtlOptions::default()).await.unwrap();
        let second = DatasetStore::open(&database, DEFAULT_TABLE).await.unwrap().load().await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_missing_input_writes_nothing() {
        let dir = tempdir().unwrap();
        let (messages, _) = write_inputs(dir.path());
        let database = dir.path().join("untouched.db");

        let err = run_etl(
            &messages,
            &dir.path().join("missing_categories.csv"),
            &database,
            EtlOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, EtlError::Csv(_)));
        assert!(err.to_string().contains("missing_categories.csv"));
        assert!(!database.exists());
    }

    #[test]
    fn test_clean_inputs_rejects_disjoint_ids() {
        let messages = vec![RawMessage {
            id: 1,
            message: "help".into(),
            original: None,
            genre: "direct".into(),
        }];
        let categories = vec![RawCategories {
            id: 2,
            categories: "related-1".into(),
        }];

        assert!(matches!(
            clean_inputs(messages, &categories),
            Err(EtlError::Clean(_))
        ));
    }
}
