//! Multi-label evaluation metrics.
//!
//! Per-label precision, recall and F1 from confusion counts, plus micro,
//! macro and support-weighted averages. Undefined ratios (no predicted or no
//! actual positives) count as 0.

use serde::Serialize;
use std::fmt;

use crate::error::{ModelError, ModelResult};

/// Metrics for one label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
    pub tp: usize,
    pub fp: usize,
    pub fn_count: usize,
}

/// An averaged row of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub labels: Vec<LabelMetrics>,
    pub micro: AverageMetrics,
    pub macro_avg: AverageMetrics,
    pub weighted: AverageMetrics,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den > 0 {
        num as f64 / den as f64
    } else {
        0.0
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

/// Confusion counts `(tp, fp, fn)` per label.
fn confusion(
    y_true: &[Vec<u8>],
    y_pred: &[Vec<u8>],
    n_labels: usize,
) -> ModelResult<Vec<(usize, usize, usize)>> {
    if y_true.len() != y_pred.len() {
        return Err(ModelError::InvalidData(format!(
            "{} label rows but {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }

    let mut counts = vec![(0, 0, 0); n_labels];
    for (row, (truth, pred)) in y_true.iter().zip(y_pred).enumerate() {
        if truth.len() != n_labels || pred.len() != n_labels {
            return Err(ModelError::InvalidData(format!(
                "row {} has {} labels and {} predictions, expected {}",
                row,
                truth.len(),
                pred.len(),
                n_labels
            )));
        }
        for (k, c) in counts.iter_mut().enumerate() {
            match (pred[k], truth[k]) {
                (1, 1) => c.0 += 1,
                (1, 0) => c.1 += 1,
                (0, 1) => c.2 += 1,
                _ => {}
            }
        }
    }
    Ok(counts)
}

/// Micro-averaged F1 over all labels.
pub fn micro_f1(y_true: &[Vec<u8>], y_pred: &[Vec<u8>]) -> ModelResult<f64> {
    let n_labels = y_true.first().map_or(0, Vec::len);
    let (tp, fp, fn_count) = confusion(y_true, y_pred, n_labels)?
        .into_iter()
        .fold((0, 0, 0), |acc, c| (acc.0 + c.0, acc.1 + c.1, acc.2 + c.2));
    Ok(f1(ratio(tp, tp + fp), ratio(tp, tp + fn_count)))
}

/// Build the full report. `names[k]` names label `k`.
pub fn classification_report(
    names: &[String],
    y_true: &[Vec<u8>],
    y_pred: &[Vec<u8>],
) -> ModelResult<ClassificationReport> {
    let counts = confusion(y_true, y_pred, names.len())?;

    let labels: Vec<LabelMetrics> = names
        .iter()
        .zip(&counts)
        .map(|(name, &(tp, fp, fn_count))| {
            let precision = ratio(tp, tp + fp);
            let recall = ratio(tp, tp + fn_count);
            LabelMetrics {
                label: name.clone(),
                precision,
                recall,
                f1: f1(precision, recall),
                support: tp + fn_count,
                tp,
                fp,
                fn_count,
            }
        })
        .collect();

    let total_support: usize = labels.iter().map(|m| m.support).sum();
    let (tp, fp, fn_count) = counts
        .iter()
        .fold((0, 0, 0), |acc, c| (acc.0 + c.0, acc.1 + c.1, acc.2 + c.2));
    let micro_p = ratio(tp, tp + fp);
    let micro_r = ratio(tp, tp + fn_count);

    let n = labels.len().max(1) as f64;
    let mean = |f: fn(&LabelMetrics) -> f64| labels.iter().map(f).sum::<f64>() / n;
    let weighted_mean = |f: fn(&LabelMetrics) -> f64| {
        if total_support == 0 {
            0.0
        } else {
            labels.iter().map(|m| f(m) * m.support as f64).sum::<f64>() / total_support as f64
        }
    };

    Ok(ClassificationReport {
        micro: AverageMetrics {
            precision: micro_p,
            recall: micro_r,
            f1: f1(micro_p, micro_r),
            support: total_support,
        },
        macro_avg: AverageMetrics {
            precision: mean(|m| m.precision),
            recall: mean(|m| m.recall),
            f1: mean(|m| m.f1),
            support: total_support,
        },
        weighted: AverageMetrics {
            precision: weighted_mean(|m| m.precision),
            recall: weighted_mean(|m| m.recall),
            f1: weighted_mean(|m| m.f1),
            support: total_support,
        },
        labels,
    })
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .labels
            .iter()
            .map(|m| m.label.len())
            .max()
            .unwrap_or(0)
            .max("weighted avg".len());

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for m in &self.labels {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.label, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;
        for (name, avg) in [
            ("micro avg", &self.micro),
            ("macro avg", &self.macro_avg),
            ("weighted avg", &self.weighted),
        ] {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, avg.support
            )?;
        }
        Ok(())
    }
}
