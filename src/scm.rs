//! The Soft Cosine Measure itself (§4.3, §4.4): `uᵀSv / (‖u‖_S · ‖v‖_S)`,
//! shared by the threshold calculator (self-similarity) and the similarity
//! scorer (cross-dataset) so the two components can never disagree on the
//! underlying math.

use crate::embedder_config::TokenSimilarityMatrix;

/// `|indices_a ∩ indices_b|` via a merge-join over two sorted slices, the
/// `S = I` fast path (§4.4).
fn intersection_count(a: &[u32], b: &[u32]) -> u32 {
    let (mut i, mut j, mut count) = (0usize, 0usize, 0u32);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                count += 1;
                i += 1;
                j += 1;
            }
        }
    }
    count
}

/// `aᵀSb` for sparse binary vectors given by their set-bit indices.
pub(crate) fn quadratic_form(a: &[u32], b: &[u32], s: &TokenSimilarityMatrix) -> f64 {
    match s {
        TokenSimilarityMatrix::Identity => f64::from(intersection_count(a, b)),
        _ => {
            let mut total = 0.0;
            for &i in a {
                for &j in b {
                    total += s.get(i, j);
                }
            }
            total
        }
    }
}

/// `sqrt(vᵀSv)` for a record's own sparse binary vector.
#[must_use]
pub fn norm(indices: &[u32], s: &TokenSimilarityMatrix) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    quadratic_form(indices, indices, s).sqrt()
}

/// `SCM(u, v)`, clipped to `[0, 1]` to absorb floating-point error at the
/// boundary (§4.4). Either side being the empty vector yields `0`, not NaN.
#[must_use]
pub fn scm(
    indices_a: &[u32],
    norm_a: f64,
    indices_b: &[u32],
    norm_b: f64,
    s: &TokenSimilarityMatrix,
) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let raw = quadratic_form(indices_a, indices_b, s) / (norm_a * norm_b);
    raw.clamp(0.0, 1.0)
}
