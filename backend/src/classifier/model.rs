//! The full text classifier: normalization, TF-IDF and random forest.

use serde::{Deserialize, Serialize};

use super::forest::{ForestParams, RandomForest, DECISION_THRESHOLD};
use super::grid::HyperParams;
use super::text::normalize;
use super::tfidf::{TfidfConfig, TfidfVectorizer};
use crate::error::{ModelError, ModelResult};

/// One label with its predicted probability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextClassifier {
    pub labels: Vec<String>,
    pub vectorizer: TfidfVectorizer,
    pub forest: RandomForest,
}

impl TextClassifier {
    /// Fit on raw texts.
    pub fn fit(
        texts: &[String],
        labels: &[Vec<u8>],
        names: Vec<String>,
        params: &HyperParams,
        seed: u64,
    ) -> ModelResult<Self> {
        let normalized: Vec<String> = texts.iter().map(|t| normalize(t)).collect();
        Self::fit_normalized(&normalized, labels, names, params, seed)
    }

    /// Fit on texts that already went through [`normalize`].
    pub fn fit_normalized(
        documents: &[String],
        labels: &[Vec<u8>],
        names: Vec<String>,
        params: &HyperParams,
        seed: u64,
    ) -> ModelResult<Self> {
        if labels.first().map_or(0, Vec::len) != names.len() {
            return Err(ModelError::InvalidData(format!(
                "{} label names for label vectors of length {}",
                names.len(),
                labels.first().map_or(0, Vec::len)
            )));
        }

        let vectorizer = TfidfVectorizer::fit(
            documents,
            TfidfConfig {
                max_df: params.max_df,
                ..TfidfConfig::default()
            },
        )?;
        let rows = vectorizer.transform_all(documents);

        let forest = RandomForest::fit(
            &rows,
            labels,
            vectorizer.n_features(),
            &ForestParams {
                n_estimators: params.n_estimators,
                min_samples_split: params.min_samples_split,
                seed,
                ..ForestParams::default()
            },
        )?;

        Ok(Self {
            labels: names,
            vectorizer,
            forest,
        })
    }

    /// Probability per label, in label order.
    pub fn predict_proba(&self, text: &str) -> Vec<f64> {
        let row = self.vectorizer.transform(&normalize(text));
        self.forest.predict_proba(&row)
    }

    pub(crate) fn predict_normalized(&self, document: &str) -> Vec<u8> {
        self.forest.predict(&self.vectorizer.transform(document))
    }

    pub fn predict(&self, text: &str) -> Vec<u8> {
        self.predict_normalized(&normalize(text))
    }

    /// Labels ranked by probability, highest first. Ties keep label order.
    pub fn rank(&self, text: &str) -> Vec<LabelScore> {
        let mut scores: Vec<LabelScore> = self
            .labels
            .iter()
            .zip(self.predict_proba(text))
            .map(|(label, score)| LabelScore {
                label: label.clone(),
                score,
            })
            .collect();
        scores.sort_by(|a, b| b.score.total_cmp(&a.score));
        scores
    }

    /// Every label with its thresholded prediction, in label order.
    pub fn classify(&self, text: &str) -> Vec<(String, bool)> {
        self.labels
            .iter()
            .cloned()
            .zip(self.predict_proba(text).into_iter().map(|p| p >= DECISION_THRESHOLD))
            .collect()
    }
}
