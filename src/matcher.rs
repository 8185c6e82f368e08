//! The one-to-one matcher (§4.5): rectangular-assignment Hungarian algorithm
//! over the similarity matrix, filtered by an optional absolute cutoff and
//! optional per-row thresholds.

use pathfinding::prelude::{kuhn_munkres, Matrix};

use crate::error::{LinkageError, Result};
use crate::similarity::SimilarityMatrix;

/// A one-to-one matching between rows of two embedded datasets: equal-length
/// `left`/`right` index sequences with `left` strictly ascending (§3).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Matching {
    left: Vec<usize>,
    right: Vec<usize>,
}

impl Matching {
    #[must_use]
    pub fn len(&self) -> usize {
        self.left.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// `(left[i], right[i])` pairs, left index ascending.
    #[must_use]
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.left.iter().copied().zip(self.right.iter().copied())
    }

    #[must_use]
    pub fn left(&self) -> &[usize] {
        &self.left
    }

    #[must_use]
    pub fn right(&self) -> &[usize] {
        &self.right
    }
}

/// Score precision used when converting `f64` similarities into the integer
/// weights the assignment solver requires. Chosen so that the tie-break bias
/// below never reorders two cells whose true similarity differs.
const PRECISION: f64 = 1_000_000_000.0;

/// Weight assigned to ineligible cells (below `abs_cutoff`, below a row's
/// required threshold, or padding introduced to square up a rectangular
/// matrix). Low enough that the solver only ever selects it when no eligible
/// alternative exists for a row or column (§4.5, §9 open-question decision).
const SENTINEL: i128 = i128::MIN / 4;

/// Maps a similarity score at `(i, j)` into the `i128` weight the solver
/// assigns that cell, given the matrix's padded dimension. Kept as a
/// standalone function so the magnitude this produces (and the magnitude of
/// `dim` assigned cells summed together, which is what the solver actually
/// returns as its total) can be tested directly without running a full
/// assignment at FEBRL scale (§8 S6).
fn cell_weight(dim128: i128, bias_span: i128, i: usize, j: usize, score: f64) -> i128 {
    let scaled = (score.clamp(0.0, 1.0) * PRECISION).round() as i128;
    let bias = (dim128 - i as i128) * (dim128 + 2) + (dim128 - j as i128);
    scaled * bias_span + bias
}

fn eligible(
    sim: &SimilarityMatrix,
    i: usize,
    j: usize,
    abs_cutoff: Option<f64>,
    require_thresholds: bool,
) -> bool {
    let score = sim.get(i, j);
    if let Some(cutoff) = abs_cutoff {
        if score < cutoff {
            return false;
        }
    }
    if require_thresholds {
        let required = sim.left_threshold(i).max(sim.right_threshold(j));
        if score < required {
            return false;
        }
    }
    true
}

/// Performs the assignment described in §4.5. Ineligible and padding cells
/// get [`SENTINEL`]; real eligible cells get their scaled score plus a tiny
/// index-dependent bias that makes the solver's otherwise-arbitrary
/// tie-breaking deterministic and spec-compliant (prefer smaller left index,
/// then smaller right index) without ever reordering two cells whose true
/// similarity differs.
pub fn assign(
    sim: &SimilarityMatrix,
    abs_cutoff: Option<f64>,
    require_thresholds: bool,
) -> Result<Matching> {
    let n1 = sim.n1();
    let n2 = sim.n2();
    if n1 == 0 || n2 == 0 {
        return Err(LinkageError::EmptyInput);
    }

    let dim = n1.max(n2);
    // Bias span large enough that two cells differing by one PRECISION unit
    // of scaled score are never reordered by the index bias, however large
    // `dim` gets within this matrix. The per-cell weight (and the sum of up
    // to `dim` of them, which is what the solver actually accumulates into
    // its returned total) is computed in `i128`: at FEBRL scale (§8 S6,
    // `dim` in the thousands) `bias_span` alone grows as `dim^2`, and the
    // assignment total as `PRECISION * dim^3`, which overflows `i64` well
    // before `dim` reaches the sizes this crate is specified to handle.
    let dim128 = dim as i128;
    let bias_span = (dim128 + 2) * (dim128 + 2) + 1;

    let mut eligible_mask = vec![false; dim * dim];
    let mut weights = vec![SENTINEL; dim * dim];

    for i in 0..n1 {
        for j in 0..n2 {
            if eligible(sim, i, j, abs_cutoff, require_thresholds) {
                weights[i * dim + j] = cell_weight(dim128, bias_span, i, j, sim.get(i, j));
                eligible_mask[i * dim + j] = true;
            }
        }
    }

    let matrix = Matrix::from_vec(dim, dim, weights)
        .expect("flat weight vector always has exactly dim*dim entries");
    let (_, assignment) = kuhn_munkres(&matrix);

    let mut left = Vec::new();
    let mut right = Vec::new();
    for (i, &j) in assignment.iter().enumerate().take(n1) {
        if j < n2 && eligible_mask[i * dim + j] {
            left.push(i);
            right.push(j);
        }
    }

    Ok(Matching { left, right })
}
