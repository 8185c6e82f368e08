//! The similarity scorer (§4.4): the full pairwise SCM matrix between two
//! embedded datasets, plus the per-row thresholds of both sides so `match`
//! can be called directly as a method on the matrix without re-threading the
//! source datasets through the caller (§3).

use rayon::prelude::*;

use crate::embedder_config::TokenSimilarityMatrix;
use crate::error::{LinkageError, Result};
use crate::matcher::{self, Matching};
use crate::record::EmbeddedDataset;
use crate::scm::scm;

const PARALLEL_THRESHOLD: usize = 64;

/// Dense `n1 x n2` matrix of SCM scores in `[0, 1]`, row-major, plus the
/// per-row acceptance thresholds of the two source datasets at the time the
/// matrix was built (§3).
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    n1: usize,
    n2: usize,
    scores: Vec<f64>,
    left_thresholds: Vec<f64>,
    right_thresholds: Vec<f64>,
}

impl SimilarityMatrix {
    #[must_use]
    pub fn n1(&self) -> usize {
        self.n1
    }

    #[must_use]
    pub fn n2(&self) -> usize {
        self.n2
    }

    /// `SCM(D1[i], D2[j])`. Panics if out of range, matching the usual
    /// contract of a dense matrix accessor; callers iterate `0..n1`/`0..n2`.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.scores[i * self.n2 + j]
    }

    #[must_use]
    pub fn left_threshold(&self, i: usize) -> f64 {
        self.left_thresholds[i]
    }

    #[must_use]
    pub fn right_threshold(&self, j: usize) -> f64 {
        self.right_thresholds[j]
    }

    /// Performs one-to-one assignment over this matrix (§4.5). `abs_cutoff`
    /// is a global floor; `require_thresholds` defaults to `true` per spec.
    pub fn find_matching(
        &self,
        abs_cutoff: Option<f64>,
        require_thresholds: Option<bool>,
    ) -> Result<Matching> {
        matcher::assign(self, abs_cutoff, require_thresholds.unwrap_or(true))
    }
}

/// Produces the full `n1 x n2` SCM matrix between two embedded datasets
/// (§4.4). Both datasets must share the same `EmbedderConfig` identity
/// (checked by fingerprint, O(1)); a mismatch fails with `ConfigMismatch`
/// before any similarity is computed.
pub fn compare(
    d1: &EmbeddedDataset,
    d2: &EmbeddedDataset,
    s: &TokenSimilarityMatrix,
) -> Result<SimilarityMatrix> {
    if d1.config_fingerprint() != d2.config_fingerprint() {
        return Err(LinkageError::ConfigMismatch);
    }

    let n1 = d1.len();
    let n2 = d2.len();

    let left: Vec<(&[u32], f64)> = d1.records().iter().map(|r| (r.indices(), r.norm())).collect();
    let right: Vec<(&[u32], f64)> = d2.records().iter().map(|r| (r.indices(), r.norm())).collect();

    let compute_row = |(indices_i, norm_i): (&[u32], f64)| -> Vec<f64> {
        right
            .iter()
            .map(|&(indices_j, norm_j)| scm(indices_i, norm_i, indices_j, norm_j, s))
            .collect()
    };

    let rows: Vec<Vec<f64>> = if n1 >= PARALLEL_THRESHOLD {
        left.par_iter().map(|&pair| compute_row(pair)).collect()
    } else {
        left.iter().map(|&pair| compute_row(pair)).collect()
    };

    let mut scores = Vec::with_capacity(n1 * n2);
    for row in rows {
        scores.extend(row);
    }

    Ok(SimilarityMatrix {
        n1,
        n2,
        scores,
        left_thresholds: d1.records().iter().map(|r| r.threshold()).collect(),
        right_thresholds: d2.records().iter().map(|r| r.threshold()).collect(),
    })
}
