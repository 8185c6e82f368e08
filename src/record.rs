//! Per-row output of embedding (§3): the sparse bit set, its SCM self-norm,
//! its per-row acceptance threshold, and (optionally) the feature bag it was
//! built from, retained only for debugging.

use serde::{Deserialize, Serialize};

use crate::shingle::FeatureBag;

/// One embedded row. `indices` is the canonical sparse form of the record's
/// binary vector; `norm > 0` iff `indices` is non-empty; `threshold` is
/// always in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedRecord {
    pub(crate) indices: Vec<u32>,
    pub(crate) norm: f64,
    pub(crate) threshold: f64,
    pub(crate) features: Option<FeatureBagDebug>,
}

/// Debug-only retained feature bag, keyed by the column it came from so a
/// caller can inspect which column contributed which shingles.
pub type FeatureBagDebug = std::collections::BTreeMap<String, Vec<String>>;

impl EmbeddedRecord {
    pub(crate) fn new(indices: Vec<u32>, norm: f64, features: Option<FeatureBagDebug>) -> Self {
        Self {
            indices,
            norm,
            threshold: 0.0,
            features,
        }
    }

    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[must_use]
    pub fn norm(&self) -> f64 {
        self.norm
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    #[must_use]
    pub fn features(&self) -> Option<&FeatureBagDebug> {
        self.features.as_ref()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub(crate) fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }
}

/// An ordered sequence of [`EmbeddedRecord`]s sharing one `EmbedderConfig`
/// (§3). Row order is the identity the matcher operates on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedDataset {
    pub(crate) config_fingerprint: u64,
    pub(crate) records: Vec<EmbeddedRecord>,
}

impl EmbeddedDataset {
    pub(crate) fn new(config_fingerprint: u64, records: Vec<EmbeddedRecord>) -> Self {
        Self {
            config_fingerprint,
            records,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[EmbeddedRecord] {
        &self.records
    }

    #[must_use]
    pub fn get(&self, i: usize) -> Option<&EmbeddedRecord> {
        self.records.get(i)
    }

    #[must_use]
    pub fn config_fingerprint(&self) -> u64 {
        self.config_fingerprint
    }

    pub(crate) fn records_mut(&mut self) -> &mut [EmbeddedRecord] {
        &mut self.records
    }
}
