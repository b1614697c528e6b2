//! TF-IDF vectorizer over normalized text.
//!
//! Documents are expected to be normalized already (see [`super::text`]).
//! The vocabulary is sorted by term so indices are deterministic; output
//! vectors are sparse, sorted by feature index and L2-normalized.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::text::tokenize;
use crate::error::{ModelError, ModelResult};

/// Sparse row: `(feature index, value)` sorted by index.
pub type SparseVec = Vec<(u32, f32)>;

/// Vocabulary pruning settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TfidfConfig {
    /// Ignore terms present in more than this fraction of documents.
    pub max_df: f64,
    /// Ignore terms present in fewer than this many documents.
    pub min_df: usize,
    /// Keep only the most frequent terms.
    pub max_features: Option<usize>,
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self {
            max_df: 1.0,
            min_df: 1,
            max_features: None,
        }
    }
}

/// Fitted TF-IDF vectorizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    /// Term to feature index mapping
    pub vocabulary: BTreeMap<String, u32>,
    /// Inverse document frequency per feature
    pub idf: Vec<f32>,
    pub config: TfidfConfig,
}

#[derive(Default)]
struct TermStats {
    doc_freq: usize,
    term_freq: usize,
}

impl TfidfVectorizer {
    /// Build the vocabulary and IDF weights from `documents`.
    pub fn fit(documents: &[String], config: TfidfConfig) -> ModelResult<Self> {
        if documents.is_empty() {
            return Err(ModelError::InvalidData("no documents to fit".into()));
        }

        let mut stats: BTreeMap<&str, TermStats> = BTreeMap::new();
        for doc in documents {
            let mut seen = HashSet::new();
            for token in tokenize(doc) {
                let entry = stats.entry(token).or_default();
                entry.term_freq += 1;
                if seen.insert(token) {
                    entry.doc_freq += 1;
                }
            }
        }

        let n_docs = documents.len();
        let max_doc_count = config.max_df * n_docs as f64;
        let mut kept: Vec<(&str, TermStats)> = stats
            .into_iter()
            .filter(|(_, s)| s.doc_freq as f64 <= max_doc_count && s.doc_freq >= config.min_df)
            .collect();

        if let Some(limit) = config.max_features {
            if kept.len() > limit {
                // Stable sort keeps alphabetical order among equal counts.
                kept.sort_by(|a, b| b.1.term_freq.cmp(&a.1.term_freq));
                kept.truncate(limit);
                kept.sort_by(|a, b| a.0.cmp(b.0));
            }
        }

        if kept.is_empty() {
            return Err(ModelError::EmptyVocabulary);
        }

        let n = n_docs as f64;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(kept.len());
        for (idx, (term, s)) in kept.into_iter().enumerate() {
            vocabulary.insert(term.to_string(), idx as u32);
            idf.push((((1.0 + n) / (1.0 + s.doc_freq as f64)).ln() + 1.0) as f32);
        }

        Ok(Self {
            vocabulary,
            idf,
            config,
        })
    }

    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    /// Transform one normalized document.
    pub fn transform(&self, document: &str) -> SparseVec {
        let mut counts: BTreeMap<u32, f32> = BTreeMap::new();
        for token in tokenize(document) {
            if let Some(&idx) = self.vocabulary.get(token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut row: SparseVec = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx as usize]))
            .collect();

        let norm = row.iter().map(|&(_, v)| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, v) in &mut row {
                *v /= norm;
            }
        }
        row
    }

    pub fn transform_all(&self, documents: &[String]) -> Vec<SparseVec> {
        documents.iter().map(|d| self.transform(d)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<String> {
        vec![
            "need water food".to_string(),
            "need water".to_string(),
            "earthquake damage".to_string(),
        ]
    }

    #[test]
    fn test_vocabulary_sorted() {
        let v = TfidfVectorizer::fit(&docs(), TfidfConfig::default()).unwrap();
        let terms: Vec<&str> = v.vocabulary.keys().map(String::as_str).collect();
        assert_eq!(terms, vec!["damage", "earthquake", "food", "need", "water"]);
        assert_eq!(v.vocabulary["damage"], 0);
        assert_eq!(v.vocabulary["water"], 4);
    }

    #[test]
    fn test_smooth_idf() {
        let v = TfidfVectorizer::fit(&docs(), TfidfConfig::default()).unwrap();
        // "need" is in 2 of 3 documents
        let expected = ((4.0f64 / 3.0).ln() + 1.0) as f32;
        assert!((v.idf[v.vocabulary["need"] as usize] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_max_df_prunes_common_terms() {
        let config = TfidfConfig {
            max_df: 0.5,
            ..TfidfConfig::default()
        };
        let v = TfidfVectorizer::fit(&docs(), config).unwrap();
        assert!(!v.vocabulary.contains_key("need"));
        assert!(!v.vocabulary.contains_key("water"));
        assert!(v.vocabulary.contains_key("food"));
    }

    #[test]
    fn test_max_features_keeps_frequent_terms() {
        let config = TfidfConfig {
            max_features: Some(2),
            ..TfidfConfig::default()
        };
        let v = TfidfVectorizer::fit(&docs(), config).unwrap();
        assert_eq!(v.n_features(), 2);
        assert!(v.vocabulary.contains_key("need"));
        assert!(v.vocabulary.contains_key("water"));
    }

    #[test]
    fn test_transform_is_unit_norm() {
        let v = TfidfVectorizer::fit(&docs(), TfidfConfig::default()).unwrap();
        let row = v.transform("need need water unknownword");
        assert_eq!(row.len(), 2);
        assert!(row[0].0 < row[1].0);
        let norm: f32 = row.iter().map(|(_, x)| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_transform_unknown_terms_is_empty() {
        let v = TfidfVectorizer::fit(&docs(), TfidfConfig::default()).unwrap();
        assert!(v.transform("tsunami").is_empty());
    }

    #[test]
    fn test_empty_vocabulary() {
        let config = TfidfConfig {
            min_df: 10,
            ..TfidfConfig::default()
        };
        assert!(matches!(
            TfidfVectorizer::fit(&docs(), config),
            Err(ModelError::EmptyVocabulary)
        ));
    }
}
