//! Immutable configuration shared by both parties in a linkage project (§3).

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use crate::error::{LinkageError, Result};

/// The optional token-similarity matrix `S` used by the soft-cosine scorer.
/// `Identity` is the common case and reduces SCM to ordinary cosine
/// similarity over binary vectors (§3, §9 open question on whether `S` is
/// ever exercised in practice).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenSimilarityMatrix {
    Identity,
    /// Row-major `m x m` matrix. Symmetric, diagonal = 1, PSD is the
    /// caller's responsibility to provide (checked only for symmetry and
    /// shape here, since full PSD verification is an eigenvalue problem out
    /// of proportion to this crate's scope).
    Dense { m: u32, values: Vec<f64> },
    /// Sparse off-diagonal entries; all unlisted off-diagonal pairs are 0,
    /// diagonal is implicitly 1. `(i, j)` with `i < j` only; the matrix is
    /// symmetric by construction.
    Sparse {
        m: u32,
        entries: Vec<(u32, u32, f64)>,
    },
}

impl TokenSimilarityMatrix {
    fn dim(&self) -> Option<u32> {
        match self {
            Self::Identity => None,
            Self::Dense { m, .. } | Self::Sparse { m, .. } => Some(*m),
        }
    }

    fn validate(&self, m: u32) -> Result<()> {
        match self {
            Self::Identity => Ok(()),
            Self::Dense { m: dim, values } => {
                if *dim != m {
                    return Err(LinkageError::InvalidConfig(format!(
                        "S dimension {dim} does not match filter width {m}"
                    )));
                }
                if values.len() != (m as usize) * (m as usize) {
                    return Err(LinkageError::InvalidConfig(
                        "S values length does not match m*m".to_string(),
                    ));
                }
                for i in 0..m as usize {
                    for j in 0..m as usize {
                        let a = values[i * m as usize + j];
                        let b = values[j * m as usize + i];
                        if (a - b).abs() > 1e-9 {
                            return Err(LinkageError::InvalidConfig(
                                "S is not symmetric".to_string(),
                            ));
                        }
                    }
                    if (values[i * m as usize + i] - 1.0).abs() > 1e-9 {
                        return Err(LinkageError::InvalidConfig(
                            "S diagonal must be 1".to_string(),
                        ));
                    }
                }
                Ok(())
            }
            Self::Sparse { m: dim, entries } => {
                if *dim != m {
                    return Err(LinkageError::InvalidConfig(format!(
                        "S dimension {dim} does not match filter width {m}"
                    )));
                }
                for &(i, j, _) in entries {
                    if i >= m || j >= m {
                        return Err(LinkageError::InvalidConfig(
                            "S entry index out of range".to_string(),
                        ));
                    }
                    if i >= j {
                        return Err(LinkageError::InvalidConfig(
                            "S sparse entries must satisfy i < j".to_string(),
                        ));
                    }
                }
                Ok(())
            }
        }
    }

    /// `S[i][j]`, 1 on the diagonal, 0 off-diagonal for `Identity`.
    #[must_use]
    pub fn get(&self, i: u32, j: u32) -> f64 {
        if i == j {
            return 1.0;
        }
        match self {
            Self::Identity => 0.0,
            Self::Dense { m, values } => values[(i as usize) * (*m as usize) + j as usize],
            Self::Sparse { entries, .. } => {
                let (a, b) = if i < j { (i, j) } else { (j, i) };
                entries
                    .iter()
                    .find(|&&(x, y, _)| x == a && y == b)
                    .map_or(0.0, |&(_, _, v)| v)
            }
        }
    }
}

/// Filter width, hash count, optional salt, and optional token-similarity
/// matrix, the triple (quadruple, with salt) both parties must agree on
/// before embedding (§3, §4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedderConfig {
    m: u32,
    k: u32,
    salt: Vec<u8>,
    s: TokenSimilarityMatrix,
    fingerprint: u64,
}

impl EmbedderConfig {
    /// Validates `m > 0`, `k > 0`, and (if present) that `S` is symmetric,
    /// unit-diagonal, and dimensioned `m x m`; fails fast with
    /// `InvalidConfig` rather than deferring the check to first use (§7).
    pub fn new(m: u32, k: u32, salt: Vec<u8>, s: TokenSimilarityMatrix) -> Result<Self> {
        if m == 0 {
            return Err(LinkageError::InvalidConfig("m must be > 0".to_string()));
        }
        if k == 0 {
            return Err(LinkageError::InvalidConfig("k must be > 0".to_string()));
        }
        if let Some(dim) = s.dim() {
            if dim != m {
                return Err(LinkageError::InvalidConfig(format!(
                    "S dimension {dim} does not match filter width {m}"
                )));
            }
        }
        s.validate(m)?;
        let fingerprint = compute_fingerprint(m, k, &salt, &s);
        Ok(Self {
            m,
            k,
            salt,
            s,
            fingerprint,
        })
    }

    #[must_use]
    pub fn m(&self) -> u32 {
        self.m
    }

    #[must_use]
    pub fn k(&self) -> u32 {
        self.k
    }

    #[must_use]
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    #[must_use]
    pub fn s(&self) -> &TokenSimilarityMatrix {
        &self.s
    }

    /// O(1) identity check used by `compare` (§4.4) instead of a deep
    /// structural comparison of `S`.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

fn compute_fingerprint(m: u32, k: u32, salt: &[u8], s: &TokenSimilarityMatrix) -> u64 {
    let mut buf = Vec::new();
    buf.extend_from_slice(&m.to_le_bytes());
    buf.extend_from_slice(&k.to_le_bytes());
    buf.extend_from_slice(salt);
    match s {
        TokenSimilarityMatrix::Identity => buf.push(0),
        TokenSimilarityMatrix::Dense { m, values } => {
            buf.push(1);
            buf.extend_from_slice(&m.to_le_bytes());
            for v in values {
                buf.extend_from_slice(&v.to_le_bytes());
            }
        }
        TokenSimilarityMatrix::Sparse { m, entries } => {
            buf.push(2);
            buf.extend_from_slice(&m.to_le_bytes());
            for (i, j, v) in entries {
                buf.extend_from_slice(&i.to_le_bytes());
                buf.extend_from_slice(&j.to_le_bytes());
                buf.extend_from_slice(&v.to_le_bytes());
            }
        }
    }
    xxh3_64(&buf)
}
