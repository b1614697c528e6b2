//! Multi-label message classifier.
//!
//! Text is normalized, vectorized with TF-IDF and scored by a random forest
//! of multi-output decision trees with balanced class weights.
//!
//! - [`text`] - Normalization and tokenization
//! - [`tfidf`] - Sparse TF-IDF vectorizer
//! - [`tree`] / [`forest`] - Multi-output CART trees and the forest
//! - [`split`] - Seeded shuffling, train/test split, k-fold
//! - [`grid`] - Hyperparameter grid and cross-validated search
//! - [`metrics`] - Per-label and averaged precision/recall/F1
//! - [`model`] - The fitted pipeline and prediction API
//! - [`artifact`] - Persisted model file
//! - [`train`] - End-to-end training run

pub mod artifact;
pub mod forest;
pub mod grid;
pub mod metrics;
pub mod model;
pub mod split;
pub mod text;
pub mod tfidf;
pub mod train;
pub mod tree;

pub use artifact::{ModelArtifact, FORMAT_VERSION};
pub use forest::{ForestParams, RandomForest, DECISION_THRESHOLD};
pub use grid::{grid_search, CvResult, GridSearchResult, HyperParams, ParamGrid};
pub use metrics::{classification_report, micro_f1, ClassificationReport, LabelMetrics};
pub use model::{LabelScore, TextClassifier};
pub use text::normalize;
pub use tfidf::{SparseVec, TfidfConfig, TfidfVectorizer};
pub use train::{run_training, train_dataset, TrainOptions, TrainOutcome, TrainSummary};
