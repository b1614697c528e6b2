//! # Disaster Response - message classification pipeline
//!
//! Cleans the labelled disaster-response message dataset into SQLite, trains
//! a multi-label TF-IDF + random forest classifier on it and serves
//! predictions and dataset statistics over HTTP.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ messages +  │────▶│     ETL     │────▶│   Trainer   │────▶│   Server    │
//! │ categories  │     │ (-> SQLite) │     │ (-> model)  │     │ (axum API)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use disaster_response::{run_etl, run_training, EtlOptions, TrainOptions};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() {
//!     let db = Path::new("DisasterResponse.db");
//!     run_etl(Path::new("messages.csv"), Path::new("categories.csv"), db, EtlOptions::default())
//!         .await
//!         .unwrap();
//!     run_training(db, Path::new("classifier.json"), &TrainOptions::default())
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (MessageRecord, Dataset)
//! - [`parser`] - CSV reading with encoding detection
//! - [`transform`] - Merge, label expansion, cleaning and the ETL pipeline
//! - [`validation`] - Cleaned-table invariants
//! - [`store`] - SQLite persistence
//! - [`classifier`] - TF-IDF, random forest, grid search, evaluation
//! - [`corpus`] - Train/dev/test JSONL export
//! - [`download`] - Model package download
//! - [`config`] - Server configuration
//! - [`api`] - HTTP API server and logging

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Cleaning
pub mod transform;
pub mod validation;

// Storage
pub mod store;

// Model
pub mod classifier;
pub mod corpus;
pub mod download;

// Serving
pub mod config;
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CleanError, CsvError, DownloadError, EtlError, ModelError, ServerError, StoreError,
    TrainError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{humanize_label, Dataset, MessageRecord, TextColumn};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, load_categories, load_messages,
    parse_bytes_auto, parse_csv_file_auto, ParseResult, RawCategories, RawMessage,
};

// =============================================================================
// Re-exports - ETL
// =============================================================================

pub use transform::{clean, expand_categories, merge_on_id, run_etl, EtlOptions, EtlSummary};
pub use validation::{is_valid, validate_dataset};
pub use store::DatasetStore;

// =============================================================================
// Re-exports - Classifier
// =============================================================================

pub use classifier::{
    run_training, LabelScore, ModelArtifact, ParamGrid, TextClassifier, TrainOptions,
    TrainSummary,
};
pub use corpus::{export_corpus, run_corpus, CorpusOptions};

// =============================================================================
// Re-exports - Server
// =============================================================================

pub use config::ServeConfig;
pub use api::{build_router, start_server, AppState};
