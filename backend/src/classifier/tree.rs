//! Multi-output CART decision tree over sparse TF-IDF rows.
//!
//! One tree predicts every label at once. Splits minimize the weighted Gini
//! impurity summed over labels, where each sample's weight for label `k` is
//! its bootstrap count times the balanced class weight of its value for `k`.
//! Features are non-negative, so a feature missing from a row reads as 0.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::tfidf::SparseVec;

/// Smallest impurity decrease accepted for a split.
const MIN_IMPROVEMENT: f64 = 1e-12;

/// Tree node, stored in a flat arena. Index 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Split {
        feature: u32,
        threshold: f32,
        left: u32,
        right: u32,
    },
    /// `(label index, positive probability)`, zero entries omitted.
    Leaf { positives: Vec<(u16, f32)> },
}

/// Parameters shared by all trees of a forest.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub min_samples_split: usize,
    pub max_depth: Option<usize>,
    /// Candidate features evaluated per split.
    pub max_features: usize,
}

/// Training matrix shared by all trees of a forest.
pub struct FitData<'a> {
    rows: &'a [SparseVec],
    /// Column view: `(sample, value)` per feature, sorted by sample.
    columns: Vec<Vec<(u32, f32)>>,
    labels: &'a [Vec<u8>],
    /// `[weight of 0, weight of 1]` per label.
    class_weights: Vec<[f64; 2]>,
    n_labels: usize,
}

impl<'a> FitData<'a> {
    pub fn new(rows: &'a [SparseVec], labels: &'a [Vec<u8>], n_features: usize) -> Self {
        let mut columns = vec![Vec::new(); n_features];
        for (s, row) in rows.iter().enumerate() {
            for &(f, v) in row {
                if let Some(column) = columns.get_mut(f as usize) {
                    column.push((s as u32, v));
                }
            }
        }

        let n_labels = labels.first().map_or(0, Vec::len);
        Self {
            rows,
            columns,
            labels,
            class_weights: balanced_class_weights(labels, n_labels),
            n_labels,
        }
    }

    pub fn n_samples(&self) -> usize {
        self.rows.len()
    }

    pub fn n_labels(&self) -> usize {
        self.n_labels
    }
}

/// Balanced class weights per label: `n / (2 * count(class))`.
///
/// A class that never occurs gets weight 0; no sample carries it anyway.
pub fn balanced_class_weights(labels: &[Vec<u8>], n_labels: usize) -> Vec<[f64; 2]> {
    let n = labels.len() as f64;
    (0..n_labels)
        .map(|k| {
            let positives = labels.iter().filter(|row| row[k] == 1).count() as f64;
            let negatives = n - positives;
            let weight = |count: f64| if count > 0.0 { n / (2.0 * count) } else { 0.0 };
            [weight(negatives), weight(positives)]
        })
        .collect()
}

/// Value of `feature` in a sparse row.
pub(crate) fn feature_value(row: &[(u32, f32)], feature: u32) -> f32 {
    row.binary_search_by_key(&feature, |&(f, _)| f)
        .map(|i| row[i].1)
        .unwrap_or(0.0)
}

fn gini(negative: f64, positive: f64) -> f64 {
    let total = negative + positive;
    if total <= 0.0 {
        return 0.0;
    }
    let p = positive / total;
    let q = negative / total;
    (1.0 - p * p - q * q).max(0.0)
}

/// Sum of per-label Gini over `[neg0, pos0, neg1, pos1, ...]` stats.
fn total_gini(stats: &[f64]) -> f64 {
    stats.chunks_exact(2).map(|c| gini(c[0], c[1])).sum()
}

/// Weighted impurity of a candidate split.
fn children_gini(left: &[f64], right: &[f64], node: &[f64]) -> f64 {
    left.chunks_exact(2)
        .zip(right.chunks_exact(2))
        .zip(node.chunks_exact(2))
        .map(|((l, r), t)| {
            let total = t[0] + t[1];
            if total <= 0.0 {
                return 0.0;
            }
            ((l[0] + l[1]) * gini(l[0], l[1]) + (r[0] + r[1]) * gini(r[0], r[1])) / total
        })
        .sum()
}

struct Split {
    feature: u32,
    threshold: f32,
    impurity: f64,
}

/// A fitted tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Grow a tree on the samples with non-zero `sample_weights`.
    pub fn fit(
        data: &FitData<'_>,
        sample_weights: &[f64],
        params: TreeParams,
        rng: ChaCha8Rng,
    ) -> Self {
        let samples: Vec<u32> = (0..data.n_samples() as u32)
            .filter(|&s| sample_weights[s as usize] > 0.0)
            .collect();

        let builder = TreeBuilder {
            data,
            sample_weights,
            params,
            rng,
            node_tag: vec![0; data.n_samples()],
            feature_tag: vec![0; data.columns.len()],
            tag: 0,
            nodes: Vec::new(),
        };
        Self {
            nodes: builder.build(samples),
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Some(Node::Split { left, right, .. }) = self.nodes.get(id) {
                stack.push((*left as usize, depth + 1));
                stack.push((*right as usize, depth + 1));
            }
        }
        max_depth
    }

    /// Leaf probabilities for `row`.
    pub fn leaf(&self, row: &[(u32, f32)]) -> &[(u16, f32)] {
        let mut id = 0usize;
        loop {
            match &self.nodes[id] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if feature_value(row, *feature) <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
                Node::Leaf { positives } => return positives,
            }
        }
    }

    /// Add this tree's probabilities for `row` into `acc`.
    pub fn accumulate(&self, row: &[(u32, f32)], acc: &mut [f64]) {
        for &(k, p) in self.leaf(row) {
            if let Some(slot) = acc.get_mut(k as usize) {
                *slot += f64::from(p);
            }
        }
    }
}

struct TreeBuilder<'d, 'a> {
    data: &'d FitData<'a>,
    sample_weights: &'d [f64],
    params: TreeParams,
    rng: ChaCha8Rng,
    /// Marks samples of the node being split.
    node_tag: Vec<u32>,
    /// Marks features already collected as candidates.
    feature_tag: Vec<u32>,
    tag: u32,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_, '_> {
    fn build(mut self, samples: Vec<u32>) -> Vec<Node> {
        self.nodes.push(Node::Leaf { positives: Vec::new() });
        let mut stack = vec![(0usize, samples, 0usize)];

        while let Some((id, samples, depth)) = stack.pop() {
            let stats = self.stats(&samples);
            let impurity = total_gini(&stats);

            let splittable = samples.len() >= self.params.min_samples_split.max(2)
                && impurity > MIN_IMPROVEMENT
                && self.params.max_depth.map_or(true, |d| depth < d);

            let split = if splittable {
                self.best_split(&samples, &stats, impurity)
            } else {
                None
            };

            match split {
                Some(split) => {
                    let (left, right) = self.partition(samples, split.feature, split.threshold);
                    let left_id = self.nodes.len();
                    self.nodes.push(Node::Leaf { positives: Vec::new() });
                    self.nodes.push(Node::Leaf { positives: Vec::new() });
                    self.nodes[id] = Node::Split {
                        feature: split.feature,
                        threshold: split.threshold,
                        left: left_id as u32,
                        right: left_id as u32 + 1,
                    };
                    stack.push((left_id + 1, right, depth + 1));
                    stack.push((left_id, left, depth + 1));
                }
                None => self.nodes[id] = leaf(&stats),
            }
        }

        self.nodes
    }

    fn accumulate(&self, stats: &mut [f64], sample: u32, sign: f64) {
        let s = sample as usize;
        let w = sign * self.sample_weights[s];
        for (k, &y) in self.data.labels[s].iter().enumerate() {
            let y = usize::from(y.min(1));
            stats[2 * k + y] += w * self.data.class_weights[k][y];
        }
    }

    fn stats(&self, samples: &[u32]) -> Vec<f64> {
        let mut stats = vec![0.0; 2 * self.data.n_labels];
        for &s in samples {
            self.accumulate(&mut stats, s, 1.0);
        }
        stats
    }

    fn best_split(&mut self, samples: &[u32], stats: &[f64], impurity: f64) -> Option<Split> {
        self.tag += 1;
        let tag = self.tag;
        let data = self.data;

        // Only features present in the node can separate it.
        let mut candidates = Vec::new();
        for &s in samples {
            self.node_tag[s as usize] = tag;
            for &(f, _) in &data.rows[s as usize] {
                if self.feature_tag[f as usize] != tag {
                    self.feature_tag[f as usize] = tag;
                    candidates.push(f);
                }
            }
        }

        let mut best: Option<Split> = None;
        let mut visited = 0;
        let n = candidates.len();
        for i in 0..n {
            if visited >= self.params.max_features {
                break;
            }
            let j = self.rng.gen_range(i..n);
            candidates.swap(i, j);

            let Some(split) = self.best_threshold(candidates[i], samples.len(), stats, tag) else {
                continue;
            };
            visited += 1;

            let bar = best.as_ref().map_or(impurity - MIN_IMPROVEMENT, |b| b.impurity);
            if split.impurity < bar {
                best = Some(split);
            }
        }
        best
    }

    /// Best threshold on one feature, or `None` if the feature is constant in the node.
    fn best_threshold(&self, feature: u32, n_samples: usize, stats: &[f64], tag: u32) -> Option<Split> {
        let mut entries: Vec<(f32, u32)> = self.data.columns[feature as usize]
            .iter()
            .filter(|&&(s, _)| self.node_tag[s as usize] == tag)
            .map(|&(s, v)| (v, s))
            .collect();
        if entries.is_empty() {
            return None;
        }
        entries.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n_zero = n_samples - entries.len();
        let mut right = vec![0.0; stats.len()];
        for &(_, s) in &entries {
            self.accumulate(&mut right, s, 1.0);
        }
        let mut left: Vec<f64> = stats.iter().zip(&right).map(|(t, r)| t - r).collect();

        let mut best: Option<Split> = None;
        let mut consider = |left: &[f64], right: &[f64], threshold: f32| {
            let impurity = children_gini(left, right, stats);
            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                best = Some(Split {
                    feature,
                    threshold,
                    impurity,
                });
            }
        };

        if n_zero > 0 {
            consider(&left, &right, entries[0].0 / 2.0);
        }

        for i in 0..entries.len() - 1 {
            let (value, s) = entries[i];
            self.accumulate(&mut left, s, 1.0);
            self.accumulate(&mut right, s, -1.0);

            let next = entries[i + 1].0;
            if next > value {
                let mut threshold = value + (next - value) / 2.0;
                if threshold >= next {
                    threshold = value;
                }
                consider(&left, &right, threshold);
            }
        }

        best
    }

    fn partition(&self, samples: Vec<u32>, feature: u32, threshold: f32) -> (Vec<u32>, Vec<u32>) {
        samples
            .into_iter()
            .partition(|&s| feature_value(&self.data.rows[s as usize], feature) <= threshold)
    }
}

fn leaf(stats: &[f64]) -> Node {
    let positives = stats
        .chunks_exact(2)
        .enumerate()
        .filter_map(|(k, c)| {
            let total = c[0] + c[1];
            if total > 0.0 && c[1] > 0.0 {
                Some((k as u16, (c[1] / total) as f32))
            } else {
                None
            }
        })
        .collect();
    Node::Leaf { positives }
}
