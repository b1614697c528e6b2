//! Error types for the disaster response pipeline.
//!
//! Each stage owns its error type:
//!
//! - [`CsvError`] - CSV reading errors with line/column context
//! - [`CleanError`] - Label expansion and cleaning errors
//! - [`StoreError`] - SQLite persistence errors
//! - [`ModelError`] - Model artifact and inference errors
//! - [`DownloadError`] - Model archive fetch/extraction errors
//! - [`EtlError`] - Top-level ETL orchestration errors
//! - [`TrainError`] - Top-level training orchestration errors
//! - [`ServerError`] - HTTP server startup errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across stage boundaries.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// CSV Errors
// =============================================================================

/// CSV reading error with file/line/column context.
#[derive(Debug, Clone)]
pub struct CsvError {
    pub path: Option<PathBuf>,
    pub line: usize,
    pub column: Option<String>,
    pub value: Option<String>,
    pub message: String,
}

impl std::fmt::Display for CsvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: ", path.display())?;
        }
        match (&self.column, &self.value) {
            (Some(col), Some(val)) => {
                write!(f, "Line {}, column '{}' (value '{}'): {}", self.line, col, val, self.message)
            }
            (Some(col), None) => {
                write!(f, "Line {}, column '{}': {}", self.line, col, self.message)
            }
            _ => {
                write!(f, "Line {}: {}", self.line, self.message)
            }
        }
    }
}

impl std::error::Error for CsvError {}

impl CsvError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            path: None,
            line,
            column: None,
            value: None,
            message: message.into(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

// =============================================================================
// Cleaning Errors
// =============================================================================

/// Errors while expanding and cleaning category labels.
#[derive(Debug, Error)]
pub enum CleanError {
    /// Nothing left after merging messages with categories.
    #[error("No rows to clean: messages and categories share no id")]
    EmptyInput,

    /// A `name-digit` cell could not be parsed.
    #[error("Row {row}: malformed category cell '{cell}'")]
    MalformedCell { row: usize, cell: String },

    /// A row carries a different label set than the first row.
    #[error("Row {row}: expected label '{expected}', found '{found}'")]
    LabelMismatch {
        row: usize,
        expected: String,
        found: String,
    },

    /// A row has more or fewer labels than the first row.
    #[error("Row {row}: expected {expected} labels, found {found}")]
    LabelCount {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Label value outside {0, 1, 2}.
    #[error("Row {row}: label '{label}' has unsupported value {value}")]
    UnsupportedValue { row: usize, label: String, value: u8 },
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors from the SQLite store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection or query failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database file does not exist (read paths never create one).
    #[error("Database not found: {0}")]
    NotFound(PathBuf),

    /// Table or column name that cannot be used as an identifier.
    #[error("Invalid identifier: '{0}'")]
    InvalidIdentifier(String),

    /// Stored table does not have the expected shape.
    #[error("Invalid table schema: {0}")]
    Schema(String),
}

// =============================================================================
// Model Errors
// =============================================================================

/// Errors from model fitting, persistence and inference.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Model file not found.
    #[error("Model file not found: {0}")]
    NotFound(PathBuf),

    /// IO error.
    #[error("Model IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Model JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Artifact written by an incompatible version.
    #[error("Unsupported model format version {found} (expected {expected})")]
    FormatVersion { found: u32, expected: u32 },

    /// Fit called with unusable data.
    #[error("Invalid training data: {0}")]
    InvalidData(String),

    /// Vectorizer pruned every term.
    #[error("Empty vocabulary: max_df/min_df left no terms")]
    EmptyVocabulary,
}

// =============================================================================
// Download Errors
// =============================================================================

/// Errors while fetching the packaged model archive.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// No URL configured and no model on disk.
    #[error("Model missing and no download URL configured")]
    NoUrl,

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success status.
    #[error("Download failed with HTTP {0}")]
    Status(u16),

    /// IO error.
    #[error("Download IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive could not be read or extracted.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The archive did not contain the expected model file.
    #[error("Archive does not contain '{0}'")]
    MissingEntry(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level ETL errors.
///
/// This is the error type returned by [`crate::transform::pipeline::run_etl`].
#[derive(Debug, Error)]
pub enum EtlError {
    /// CSV reading error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Cleaning error.
    #[error("Clean error: {0}")]
    Clean(#[from] CleanError),

    /// Storage error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Cleaned table violates an invariant.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

/// Top-level training errors.
#[derive(Debug, Error)]
pub enum TrainError {
    /// Storage error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Model error.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// IO error (corpus export).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error (corpus export).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Too few rows for the requested split.
    #[error("Not enough rows: {0}")]
    NotEnoughRows(String),

    /// Empty hyperparameter grid.
    #[error("Hyperparameter grid is empty")]
    EmptyGrid,
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Dataset could not be loaded.
    #[error("Dataset error: {0}")]
    Store(#[from] StoreError),

    /// Model could not be loaded.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Model archive could not be fetched.
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    /// Socket error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for cleaning operations.
pub type CleanResult<T> = Result<T, CleanError>;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Result type for ETL operations.
pub type EtlResult<T> = Result<T, EtlError>;

/// Result type for training operations.
pub type TrainResult<T> = Result<T, TrainError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
