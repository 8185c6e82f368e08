//! Norm and per-row threshold calculation (§4.3).
//!
//! The norm itself lives in [`crate::scm`] since both this module and the
//! similarity scorer need the identical quadratic form; this module is
//! concerned with the threshold half: deriving, per row, the minimum
//! cross-dataset similarity that row is willing to accept, from the
//! empirical distribution of its similarity to every other row of its own
//! dataset.

use rayon::prelude::*;

use crate::embedder_config::TokenSimilarityMatrix;
use crate::record::EmbeddedDataset;
use crate::scm::scm;

/// Below this row count the sequential path is used; parallelizing a
/// handful of rows only adds scheduling overhead (§5).
const PARALLEL_THRESHOLD: usize = 64;

/// How the self-similarity distribution is reduced to a single threshold,
/// and how large that distribution is allowed to get before it is
/// subsampled (§4.3, §9 open question).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdConfig {
    /// Quantile of the N-1 self-similarity scores to use as the threshold.
    /// `1.0` (the default) takes the maximum: no row in the same dataset may
    /// out-score the true match.
    pub alpha: f64,
    /// Upper bound on how many of the other `N-1` rows are compared against
    /// when deriving a row's threshold. `None` means the full `N-1`.
    pub subsample_cap: Option<usize>,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            subsample_cap: None,
        }
    }
}

/// Deterministic fixed-stride subsample of `0..n` excluding `skip`, capped at
/// `cap` entries. Fixed stride (not random draw) keeps threshold derivation
/// reproducible without exchanging an RNG seed between parties (§4.3, §8
/// property 5).
fn sampled_indices(n: usize, skip: usize, cap: usize) -> Vec<usize> {
    let others = n - 1; // n includes `skip` itself
    if others <= cap {
        return (0..n).filter(|&i| i != skip).collect();
    }
    let stride = (others as f64 / cap as f64).ceil() as usize;
    let stride = stride.max(1);
    (0..n)
        .filter(|&i| i != skip)
        .step_by(stride)
        .take(cap)
        .collect()
}

fn quantile(mut scores: Vec<f64>, alpha: f64) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.sort_by(|a, b| a.partial_cmp(b).unwrap());
    if alpha >= 1.0 {
        return *scores.last().unwrap();
    }
    let alpha = alpha.clamp(0.0, 1.0);
    let pos = alpha * (scores.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        scores[lo]
    } else {
        let frac = pos - lo as f64;
        scores[lo] * (1.0 - frac) + scores[hi] * frac
    }
}

fn row_threshold(
    i: usize,
    records: &[(Vec<u32>, f64)],
    s: &TokenSimilarityMatrix,
    config: &ThresholdConfig,
) -> f64 {
    let (indices_i, norm_i) = &records[i];
    if *norm_i == 0.0 {
        return 0.0;
    }
    let n = records.len();
    let cap = config.subsample_cap.unwrap_or(n.saturating_sub(1));
    let others = sampled_indices(n, i, cap.max(1));
    let scores: Vec<f64> = others
        .into_iter()
        .map(|j| {
            let (indices_j, norm_j) = &records[j];
            scm(indices_i, *norm_i, indices_j, *norm_j, s)
        })
        .collect();
    quantile(scores, config.alpha)
}

/// Recomputes and attaches the per-row threshold of every record in
/// `dataset` against the self-distribution of that same dataset (§4.3).
/// Called whenever the dataset contents or the `EmbedderConfig` change.
pub fn compute_thresholds(
    dataset: &mut EmbeddedDataset,
    s: &TokenSimilarityMatrix,
    config: &ThresholdConfig,
) {
    let snapshot: Vec<(Vec<u32>, f64)> = dataset
        .records()
        .iter()
        .map(|r| (r.indices().to_vec(), r.norm()))
        .collect();
    let n = snapshot.len();

    let thresholds: Vec<f64> = if n >= PARALLEL_THRESHOLD {
        (0..n)
            .into_par_iter()
            .map(|i| row_threshold(i, &snapshot, s, config))
            .collect()
    } else {
        (0..n).map(|i| row_threshold(i, &snapshot, s, config)).collect()
    };

    for (record, threshold) in dataset.records_mut().iter_mut().zip(thresholds) {
        record.set_threshold(threshold);
    }
}
