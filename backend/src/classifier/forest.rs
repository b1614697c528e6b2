//! Random forest of multi-output decision trees.
//!
//! Each tree is grown on a bootstrap sample (drawn counts act as sample
//! weights) with `sqrt(n_features)` candidate features per split. Tree `t`
//! uses the RNG seeded with `seed + t`, so a forest is fully determined by
//! its parameters and training data.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::tfidf::SparseVec;
use super::tree::{DecisionTree, FitData, TreeParams};
use crate::error::{ModelError, ModelResult};

/// Probability at or above which a label is predicted.
pub const DECISION_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub min_samples_split: usize,
    pub max_depth: Option<usize>,
    /// Candidate features per split; `None` means `sqrt(n_features)`.
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            min_samples_split: 2,
            max_depth: None,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_labels: usize,
    n_features: usize,
}

impl RandomForest {
    /// Fit the forest on sparse rows and their label vectors.
    pub fn fit(
        rows: &[SparseVec],
        labels: &[Vec<u8>],
        n_features: usize,
        params: &ForestParams,
    ) -> ModelResult<Self> {
        if rows.is_empty() {
            return Err(ModelError::InvalidData("no training rows".into()));
        }
        if rows.len() != labels.len() {
            return Err(ModelError::InvalidData(format!(
                "{} rows but {} label vectors",
                rows.len(),
                labels.len()
            )));
        }
        let n_labels = labels[0].len();
        if n_labels == 0 || labels.iter().any(|l| l.len() != n_labels) {
            return Err(ModelError::InvalidData("label vectors must share a non-zero length".into()));
        }
        if params.n_estimators == 0 {
            return Err(ModelError::InvalidData("n_estimators must be at least 1".into()));
        }
        if params.min_samples_split < 2 {
            return Err(ModelError::InvalidData("min_samples_split must be at least 2".into()));
        }

        let data = FitData::new(rows, labels, n_features);
        let tree_params = TreeParams {
            min_samples_split: params.min_samples_split,
            max_depth: params.max_depth,
            max_features: params
                .max_features
                .unwrap_or_else(|| (n_features as f64).sqrt() as usize)
                .max(1),
        };

        let n = rows.len();
        let trees = (0..params.n_estimators)
            .map(|t| {
                let mut rng = ChaCha8Rng::seed_from_u64(params.seed.wrapping_add(t as u64));
                let weights = if params.bootstrap {
                    let mut counts = vec![0.0; n];
                    for _ in 0..n {
                        counts[rng.gen_range(0..n)] += 1.0;
                    }
                    counts
                } else {
                    vec![1.0; n]
                };
                DecisionTree::fit(&data, &weights, tree_params, rng)
            })
            .collect();

        Ok(Self {
            trees,
            n_labels,
            n_features,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_labels(&self) -> usize {
        self.n_labels
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Mean positive probability per label.
    pub fn predict_proba(&self, row: &[(u32, f32)]) -> Vec<f64> {
        let mut acc = vec![0.0; self.n_labels];
        for tree in &self.trees {
            tree.accumulate(row, &mut acc);
        }
        let n = self.trees.len().max(1) as f64;
        acc.iter_mut().for_each(|p| *p /= n);
        acc
    }

    /// 0/1 prediction per label.
    pub fn predict(&self, row: &[(u32, f32)]) -> Vec<u8> {
        self.predict_proba(row)
            .into_iter()
            .map(|p| u8::from(p >= DECISION_THRESHOLD))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feature 0 => label 0, feature 1 => label 1, feature 2 => neither.
    fn toy() -> (Vec<SparseVec>, Vec<Vec<u8>>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..30u32 {
            let noise = 3 + (i % 5);
            match i % 3 {
                0 => {
                    rows.push(vec![(0, 0.9), (noise, 0.1)]);
                    labels.push(vec![1, 0]);
                }
                1 => {
                    rows.push(vec![(1, 0.9), (noise, 0.1)]);
                    labels.push(vec![0, 1]);
                }
                _ => {
                    rows.push(vec![(2, 0.9), (noise, 0.1)]);
                    labels.push(vec![0, 0]);
                }
            }
        }
        (rows, labels)
    }

    fn params(n_estimators: usize) -> ForestParams {
        ForestParams {
            n_estimators,
            max_features: Some(8),
            ..ForestParams::default()
        }
    }

    #[test]
    fn test_learns_separable_labels() {
        let (rows, labels) = toy();
        let forest = RandomForest::fit(&rows, &labels, 8, &params(15)).unwrap();

        assert_eq!(forest.n_trees(), 15);
        assert_eq!(forest.predict(&[(0, 1.0)]), vec![1, 0]);
        assert_eq!(forest.predict(&[(1, 1.0)]), vec![0, 1]);
        assert_eq!(forest.predict(&[(2, 1.0)]), vec![0, 0]);
    }

    #[test]
    fn test_probabilities_in_unit_range() {
        let (rows, labels) = toy();
        let forest = RandomForest::fit(&rows, &labels, 8, &params(5)).unwrap();
        for p in forest.predict_proba(&[(0, 0.5), (1, 0.5)]) {
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (rows, labels) = toy();
        let p = ForestParams {
            max_features: None,
            ..params(4)
        };
        let a = RandomForest::fit(&rows, &labels, 8, &p).unwrap();
        let b = RandomForest::fit(&rows, &labels, 8, &p).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_bad_input() {
        let (rows, labels) = toy();
        assert!(RandomForest::fit(&rows[..2], &labels, 8, &params(1)).is_err());
        assert!(RandomForest::fit(&[], &[], 8, &params(1)).is_err());

        let p = ForestParams {
            min_samples_split: 1,
            ..params(1)
        };
        assert!(RandomForest::fit(&rows, &labels, 8, &p).is_err());
    }
}
