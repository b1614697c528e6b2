//! Training orchestration: load, split, search, evaluate, save.
//!
//! # Example
//!
//! ```rust,ignore
//! use disaster_response::classifier::{run_training, TrainOptions};
//! use std::path::Path;
//!
//! let summary = run_training(
//!     Path::new("DisasterResponse.db"),
//!     Path::new("models/classifier.json"),
//!     &TrainOptions::default(),
//! ).await?;
//! println!("{}", summary.report);
//! ```

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::artifact::ModelArtifact;
use super::grid::{grid_search, GridSearchResult, ParamGrid};
use super::metrics::{classification_report, ClassificationReport};
use super::model::TextClassifier;
use super::split::{select, train_test_split};
use super::text::normalize;
use crate::api::logs::{log_info, log_info_indent, log_success};
use crate::error::{TrainError, TrainResult};
use crate::models::{Dataset, TextColumn};
use crate::store::{DatasetStore, DEFAULT_TABLE};

#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub table: String,
    pub seed: u64,
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    /// Cross-validation folds
    pub folds: usize,
    pub grid: ParamGrid,
    pub text_column: TextColumn,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            seed: 42,
            test_size: 0.2,
            folds: 3,
            grid: ParamGrid::default(),
            text_column: TextColumn::Message,
        }
    }
}

/// Result of an in-memory training run.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub artifact: ModelArtifact,
    pub search: GridSearchResult,
    pub report: ClassificationReport,
    pub train_rows: usize,
    pub test_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainSummary {
    pub train_rows: usize,
    pub test_rows: usize,
    pub search: GridSearchResult,
    pub report: ClassificationReport,
    pub model_path: PathBuf,
}

/// Fit and evaluate on an in-memory dataset. No files are touched.
pub fn train_dataset(dataset: &Dataset, options: &TrainOptions) -> TrainResult<TrainOutcome> {
    if options.grid.candidates().is_empty() {
        return Err(TrainError::EmptyGrid);
    }

    let split = train_test_split(dataset.len(), options.test_size, options.seed);
    if split.test.is_empty() || split.train.len() < options.folds.max(2) {
        return Err(TrainError::NotEnoughRows(format!(
            "{} rows cannot be split into train/test with {} folds",
            dataset.len(),
            options.folds
        )));
    }

    let documents: Vec<String> = dataset
        .records
        .iter()
        .map(|r| normalize(r.text(options.text_column)))
        .collect();
    let labels = dataset.label_rows();

    let train_docs = select(&documents, &split.train);
    let train_labels = select(&labels, &split.train);

    log_info("Searching hyperparameters...");
    log_info_indent(
        format!(
            "{} candidates x {} folds on {} rows",
            options.grid.candidates().len(),
            options.folds,
            train_docs.len()
        ),
        1,
    );
    let search = grid_search(
        &train_docs,
        &train_labels,
        &dataset.labels,
        &options.grid,
        options.folds,
        options.seed,
    )?;
    log_success(format!(
        "Best: {} (micro-F1 {:.4})",
        search.best, search.best_score
    ));

    log_info("Refitting on the full training split...");
    let classifier = TextClassifier::fit_normalized(
        &train_docs,
        &train_labels,
        dataset.labels.clone(),
        &search.best,
        options.seed,
    )?;

    log_info("Evaluating model...");
    let test_labels = select(&labels, &split.test);
    let predicted: Vec<Vec<u8>> = split
        .test
        .iter()
        .map(|&i| classifier.predict_normalized(&documents[i]))
        .collect();
    let report = classification_report(&dataset.labels, &test_labels, &predicted)?;

    let artifact = ModelArtifact::new(
        classifier,
        search.best,
        options.seed,
        options.text_column,
        search.best_score,
        report.micro.f1,
    );

    Ok(TrainOutcome {
        artifact,
        search,
        report,
        train_rows: split.train.len(),
        test_rows: split.test.len(),
    })
}

/// Load the table, train, print the report and save the best model.
pub async fn run_training(
    database: &Path,
    model_path: &Path,
    options: &TrainOptions,
) -> TrainResult<TrainSummary> {
    log_info("Loading data...");
    log_info_indent(format!("DATABASE: {}", database.display()), 1);
    let store = DatasetStore::open(database, &options.table).await?;
    let dataset = store.load().await?;
    store.close().await;
    log_success(format!(
        "{} messages, {} labels",
        dataset.len(),
        dataset.labels.len()
    ));

    let outcome = train_dataset(&dataset, options)?;
    println!("{}", outcome.report);

    log_info("Saving model...");
    log_info_indent(format!("MODEL: {}", model_path.display()), 1);
    outcome.artifact.save(model_path)?;
    log_success("Trained model saved!");

    Ok(TrainSummary {
        train_rows: outcome.train_rows,
        test_rows: outcome.test_rows,
        search: outcome.search,
        report: outcome.report,
        model_path: model_path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::model::tests::toy_corpus;
    use crate::models::MessageRecord;

    fn dataset() -> Dataset {
        let (texts, labels, names) = toy_corpus();
        let records = texts
            .into_iter()
            .zip(labels)
            .enumerate()
            .map(|(i, (message, labels))| MessageRecord {
                id: i as i64,
                message,
                original: None,
                genre: "direct".into(),
                labels,
            })
            .collect();
        Dataset::new(names, records)
    }

    fn quick_options() -> TrainOptions {
        TrainOptions {
            grid: ParamGrid::quick(),
            ..TrainOptions::default()
        }
    }

    #[test]
    fn test_train_dataset_split_sizes() {
        let outcome = train_dataset(&dataset(), &quick_options()).unwrap();

        assert_eq!(outcome.train_rows + outcome.test_rows, 36);
        assert_eq!(outcome.test_rows, 8);
        assert_eq!(outcome.search.results.len(), 1);
        assert_eq!(outcome.report.labels.len(), 3);
        assert_eq!(outcome.artifact.labels(), dataset().labels.as_slice());
        assert_eq!(outcome.artifact.test_score, outcome.report.micro.f1);
    }

    #[test]
    fn test_same_seed_same_metrics() {
        let a = train_dataset(&dataset(), &quick_options()).unwrap();
        let b = train_dataset(&dataset(), &quick_options()).unwrap();
        assert_eq!(a.report, b.report);
        assert_eq!(a.search, b.search);
        assert_eq!(a.artifact.classifier, b.artifact.classifier);
    }

    #[test]
    fn test_empty_grid() {
        let options = TrainOptions {
            grid: ParamGrid {
                max_df: vec![],
                n_estimators: vec![10],
                min_samples_split: vec![2],
            },
            ..TrainOptions::default()
        };
        assert!(matches!(
            train_dataset(&dataset(), &options),
            Err(TrainError::EmptyGrid)
        ));
    }

    #[test]
    fn test_too_few_rows() {
        let mut small = dataset();
        small.records.truncate(2);
        assert!(matches!(
            train_dataset(&small, &quick_options()),
            Err(TrainError::NotEnoughRows(_))
        ));
    }
}
