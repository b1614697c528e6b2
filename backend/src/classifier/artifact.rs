//! Persisted model: the fitted classifier plus how it was trained.
//!
//! Stored as one JSON file, written to a temporary sibling and renamed into
//! place so readers never see a partial file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use uuid::Uuid;

use super::grid::HyperParams;
use super::model::{LabelScore, TextClassifier};
use crate::error::{ModelError, ModelResult};
use crate::models::TextColumn;

/// Current artifact layout version.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub params: HyperParams,
    pub seed: u64,
    #[serde(default)]
    pub text_column: TextColumn,
    /// Mean cross-validated micro-F1 of `params`
    pub cv_score: f64,
    /// Held-out micro-F1
    pub test_score: f64,
    pub classifier: TextClassifier,
}

impl ModelArtifact {
    pub fn new(
        classifier: TextClassifier,
        params: HyperParams,
        seed: u64,
        text_column: TextColumn,
        cv_score: f64,
        test_score: f64,
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            id: Uuid::new_v4(),
            trained_at: Utc::now(),
            params,
            seed,
            text_column,
            cv_score,
            test_score,
            classifier,
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.classifier.labels
    }

    pub fn rank(&self, text: &str) -> Vec<LabelScore> {
        self.classifier.rank(text)
    }

    pub fn classify(&self, text: &str) -> Vec<(String, bool)> {
        self.classifier.classify(text)
    }

    /// Write atomically to `path`, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> ModelResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");

        let json = serde_json::to_vec(self)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> ModelResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ModelError::NotFound(path.to_path_buf()));
        }

        let bytes = fs::read(path)?;

        // Check the version before decoding the rest of the layout.
        #[derive(Deserialize)]
        struct Header {
            format_version: u32,
        }
        let header: Header = serde_json::from_slice(&bytes)?;
        if header.format_version != FORMAT_VERSION {
            return Err(ModelError::FormatVersion {
                found: header.format_version,
                expected: FORMAT_VERSION,
            });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}
