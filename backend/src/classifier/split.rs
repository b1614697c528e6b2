//! Seeded shuffling and dataset partitioning.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// `0..n` in a seed-determined order.
pub fn shuffled_indices(n: usize, seed: u64) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    indices
}

/// Train/test partition of row indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with `seed` and hold out the last `ceil(test_size * n)` rows.
pub fn train_test_split(n: usize, test_size: f64, seed: u64) -> TrainTestSplit {
    let order = shuffled_indices(n, seed);
    let n_test = ((test_size.clamp(0.0, 1.0) * n as f64).ceil() as usize).min(n);
    let (train, test) = order.split_at(n - n_test);
    TrainTestSplit {
        train: train.to_vec(),
        test: test.to_vec(),
    }
}

/// Contiguous k-fold partition of positions `0..n`.
///
/// Returns `(train, validation)` position lists. The first `n % k` folds are
/// one row larger.
pub fn kfold(n: usize, k: usize) -> Vec<(Vec<usize>, Vec<usize>)> {
    let k = k.clamp(1, n.max(1));
    let base = n / k;
    let extra = n % k;

    let mut folds = Vec::with_capacity(k);
    let mut start = 0;
    for fold in 0..k {
        let size = base + usize::from(fold < extra);
        let end = start + size;
        let validation: Vec<usize> = (start..end).collect();
        let train: Vec<usize> = (0..start).chain(end..n).collect();
        folds.push((train, validation));
        start = end;
    }
    folds
}

/// Pick `items[i]` for every index.
pub fn select<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| items[i].clone()).collect()
}
