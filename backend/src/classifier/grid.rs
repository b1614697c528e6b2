//! Hyperparameter grid and cross-validated search.

use serde::{Deserialize, Serialize};

use super::metrics::micro_f1;
use super::model::TextClassifier;
use super::split::{kfold, select};
use crate::api::logs::{log_info_indent, log_warning};
use crate::error::{ModelError, ModelResult};

/// One point of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HyperParams {
    /// TF-IDF document-frequency cutoff
    pub max_df: f64,
    /// Trees in the forest
    pub n_estimators: usize,
    pub min_samples_split: usize,
}

impl std::fmt::Display for HyperParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "max_df={}, n_estimators={}, min_samples_split={}",
            self.max_df, self.n_estimators, self.min_samples_split
        )
    }
}

/// Values to try per hyperparameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    pub max_df: Vec<f64>,
    pub n_estimators: Vec<usize>,
    pub min_samples_split: Vec<usize>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            max_df: vec![0.5, 1.0],
            n_estimators: vec![10, 100],
            min_samples_split: vec![2, 4],
        }
    }
}

impl ParamGrid {
    /// Single small configuration, for smoke runs.
    pub fn quick() -> Self {
        Self {
            max_df: vec![1.0],
            n_estimators: vec![10],
            min_samples_split: vec![2],
        }
    }

    /// Every combination, `max_df` outermost.
    pub fn candidates(&self) -> Vec<HyperParams> {
        let mut out = Vec::new();
        for &max_df in &self.max_df {
            for &n_estimators in &self.n_estimators {
                for &min_samples_split in &self.min_samples_split {
                    out.push(HyperParams {
                        max_df,
                        n_estimators,
                        min_samples_split,
                    });
                }
            }
        }
        out
    }
}

/// Cross-validation outcome of one candidate.
///
/// A candidate that failed to fit on some fold has `mean_score = NaN` and
/// the failure in `error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CvResult {
    pub params: HyperParams,
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
    pub error: Option<String>,
}

impl CvResult {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridSearchResult {
    pub best: HyperParams,
    pub best_score: f64,
    pub results: Vec<CvResult>,
}

/// K-fold search over `grid`, scored by micro-F1.
///
/// `documents` must already be normalized. Folds are contiguous in the given
/// order, so callers shuffle beforehand. Ties keep the earlier candidate.
/// A candidate that fails on any fold is recorded and skipped; the search
/// only fails when no candidate could be scored.
pub fn grid_search(
    documents: &[String],
    labels: &[Vec<u8>],
    names: &[String],
    grid: &ParamGrid,
    folds: usize,
    seed: u64,
) -> ModelResult<GridSearchResult> {
    let candidates = grid.candidates();
    if candidates.is_empty() {
        return Err(ModelError::InvalidData("hyperparameter grid is empty".into()));
    }
    if folds < 2 || documents.len() < folds {
        return Err(ModelError::InvalidData(format!(
            "{} folds need at least 2 folds and as many rows (have {})",
            folds,
            documents.len()
        )));
    }

    let splits = kfold(documents.len(), folds);
    let mut results = Vec::with_capacity(candidates.len());
    let mut best: Option<(HyperParams, f64)> = None;
    let mut first_error: Option<ModelError> = None;

    for (c, params) in candidates.into_iter().enumerate() {
        log_info_indent(format!("[{}] {}", c + 1, params), 1);

        match cross_validate(documents, labels, names, &splits, &params, seed) {
            Ok(fold_scores) => {
                let mean_score = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
                log_info_indent(format!("mean micro-F1 {:.4}", mean_score), 2);

                if best.map_or(true, |(_, score)| mean_score > score) {
                    best = Some((params, mean_score));
                }
                results.push(CvResult {
                    params,
                    fold_scores,
                    mean_score,
                    error: None,
                });
            }
            Err(e) => {
                log_warning(format!("Candidate [{}] skipped: {}", c + 1, e));
                results.push(CvResult {
                    params,
                    fold_scores: Vec::new(),
                    mean_score: f64::NAN,
                    error: Some(e.to_string()),
                });
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    let Some((best, best_score)) = best else {
        return Err(first_error
            .unwrap_or_else(|| ModelError::InvalidData("no candidate scored".into())));
    };
    Ok(GridSearchResult {
        best,
        best_score,
        results,
    })
}

/// Micro-F1 of `params` on every fold.
fn cross_validate(
    documents: &[String],
    labels: &[Vec<u8>],
    names: &[String],
    splits: &[(Vec<usize>, Vec<usize>)],
    params: &HyperParams,
    seed: u64,
) -> ModelResult<Vec<f64>> {
    let mut fold_scores = Vec::with_capacity(splits.len());
    for (train, validation) in splits {
        let model = TextClassifier::fit_normalized(
            &select(documents, train),
            &select(labels, train),
            names.to_vec(),
            params,
            seed,
        )?;
        let predicted: Vec<Vec<u8>> = validation
            .iter()
            .map(|&i| model.predict_normalized(&documents[i]))
            .collect();
        fold_scores.push(micro_f1(&select(labels, validation), &predicted)?);
    }
    Ok(fold_scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::model::tests::toy_corpus;
    use crate::classifier::split::shuffled_indices;
    use crate::classifier::text::normalize;

    #[test]
    fn test_default_grid_has_eight_candidates() {
        let candidates = ParamGrid::default().candidates();
        assert_eq!(candidates.len(), 8);
        assert_eq!(
            candidates[0],
            HyperParams {
                max_df: 0.5,
                n_estimators: 10,
                min_samples_split: 2
            }
        );
        assert_eq!(candidates[7].n_estimators, 100);
    }

    #[test]
    fn test_grid_search_picks_a_candidate() {
        let (texts, labels, names) = toy_corpus();
        let order = shuffled_indices(texts.len(), 42);
        let documents: Vec<String> = order.iter().map(|&i| normalize(&texts[i])).collect();
        let labels: Vec<Vec<u8>> = order.iter().map(|&i| labels[i].clone()).collect();

        let grid = ParamGrid {
            max_df: vec![1.0],
            n_estimators: vec![3, 5],
            min_samples_split: vec![2],
        };
        let result = grid_search(&documents, &labels, &names, &grid, 3, 42).unwrap();

        assert_eq!(result.results.len(), 2);
        assert!(result.results.iter().all(|r| r.fold_scores.len() == 3));
        let top = result
            .results
            .iter()
            .map(|r| r.mean_score)
            .fold(f64::MIN, f64::max);
        assert_eq!(result.best_score, top);
        assert!(grid.candidates().contains(&result.best));
    }

    /// Every document shares "help" and "please"; half mention water.
    fn pruned_corpus() -> (Vec<String>, Vec<Vec<u8>>, Vec<String>) {
        let documents: Vec<String> = (0..12)
            .map(|i| {
                if i % 2 == 0 {
                    "help please water".to_string()
                } else {
                    "help please".to_string()
                }
            })
            .collect();
        let labels = (0..12).map(|i| vec![u8::from(i % 2 == 0)]).collect();
        (documents, labels, vec!["water".into()])
    }

    #[test]
    fn test_failing_candidate_is_skipped() {
        let (documents, labels, names) = pruned_corpus();
        // max_df=0.4 prunes every term on every fold
        let grid = ParamGrid {
            max_df: vec![0.4, 1.0],
            n_estimators: vec![3],
            min_samples_split: vec![2],
        };
        let result = grid_search(&documents, &labels, &names, &grid, 3, 42).unwrap();

        assert_eq!(result.results.len(), 2);
        assert!(result.results[0].failed());
        assert!(result.results[0].mean_score.is_nan());
        assert!(!result.results[1].failed());
        assert_eq!(result.best.max_df, 1.0);
        assert_eq!(result.best_score, result.results[1].mean_score);
    }

    #[test]
    fn test_every_candidate_failing_is_an_error() {
        let (documents, labels, names) = pruned_corpus();
        let grid = ParamGrid {
            max_df: vec![0.3, 0.4],
            n_estimators: vec![3],
            min_samples_split: vec![2],
        };
        assert!(matches!(
            grid_search(&documents, &labels, &names, &grid, 3, 42),
            Err(ModelError::EmptyVocabulary)
        ));
    }

    #[test]
    fn test_grid_search_rejects_empty_grid() {
        let (texts, labels, names) = toy_corpus();
        let grid = ParamGrid {
            max_df: vec![],
            ..ParamGrid::default()
        };
        assert!(grid_search(&texts, &labels, &names, &grid, 3, 42).is_err());
    }
}
