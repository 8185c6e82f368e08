//! The thin orchestrator (§2, §6): owns the embedder configuration and
//! feature-factory registry, drives extraction and embedding per row, and
//! exposes `embed`/`compare` as the core's public surface. Matching lives on
//! the resulting [`SimilarityMatrix`] itself (§3), not on the orchestrator.

use rayon::prelude::*;

use crate::bloom::embed_positions;
use crate::embedder_config::EmbedderConfig;
use crate::error::Result;
use crate::extractors::FeatureFactory;
use crate::record::{EmbeddedDataset, EmbeddedRecord, FeatureBagDebug};
use crate::scm;
use crate::shingle::{FeatureBag, Shingle};
use crate::similarity::{self, SimilarityMatrix};
use crate::table::{ColumnSpec, Table};
use crate::threshold::{self, ThresholdConfig};

const PARALLEL_THRESHOLD: usize = 64;

/// Wires feature extraction, the Bloom embedder, and the threshold
/// calculator together behind the three-method public surface named in §6.
pub struct Embedder {
    config: EmbedderConfig,
    factory: FeatureFactory,
    threshold_config: ThresholdConfig,
    retain_features: bool,
}

impl Embedder {
    #[must_use]
    pub fn new(config: EmbedderConfig, factory: FeatureFactory) -> Self {
        Self {
            config,
            factory,
            threshold_config: ThresholdConfig::default(),
            retain_features: false,
        }
    }

    #[must_use]
    pub fn with_threshold_config(mut self, threshold_config: ThresholdConfig) -> Self {
        self.threshold_config = threshold_config;
        self
    }

    /// Whether `embed` retains each record's `FeatureBag` for debugging
    /// (§3: "kept for debugging/inspection only"). Off by default, since the
    /// retained bag roughly doubles a record's serialized size.
    #[must_use]
    pub fn with_debug_features(mut self, retain: bool) -> Self {
        self.retain_features = retain;
        self
    }

    #[must_use]
    pub fn config(&self) -> &EmbedderConfig {
        &self.config
    }

    #[must_use]
    pub fn factory(&self) -> &FeatureFactory {
        &self.factory
    }

    fn extract_row(&self, table: &dyn Table, row: usize, colspec: &ColumnSpec) -> Result<(FeatureBag, Option<FeatureBagDebug>)> {
        let mut bag = FeatureBag::new();
        let mut debug: Option<FeatureBagDebug> = self.retain_features.then(FeatureBagDebug::new);

        for mapping in colspec.mappings() {
            let extractor = self.factory.get(&mapping.feature_type)?;
            let value = table.value(row, &mapping.column).unwrap_or("");
            let label = mapping.label.as_deref().unwrap_or(&mapping.column);
            let shingles = extractor.extract(value, label)?;

            if let Some(debug) = debug.as_mut() {
                let tokens: Vec<String> = shingles
                    .iter()
                    .map(|s: &Shingle| String::from_utf8_lossy(s.token()).into_owned())
                    .collect();
                debug.entry(mapping.column.clone()).or_default().extend(tokens);
            }
            bag.extend(shingles);
        }

        Ok((bag, debug))
    }

    fn embed_row(&self, table: &dyn Table, row: usize, colspec: &ColumnSpec) -> Result<EmbeddedRecord> {
        let (bag, debug) = self.extract_row(table, row, colspec)?;
        let indices = embed_positions(&bag, &self.config);
        let norm = scm::norm(&indices, self.config.s());
        Ok(EmbeddedRecord::new(indices, norm, debug))
    }

    /// Embeds every row of `table` under `colspec` (§4.2), optionally
    /// recomputing each row's per-row acceptance threshold against the
    /// resulting dataset's self-similarity distribution (§4.3).
    pub fn embed(
        &self,
        table: &dyn Table,
        colspec: &ColumnSpec,
        update_thresholds: bool,
    ) -> Result<EmbeddedDataset> {
        let n = table.row_count();

        let records: Vec<EmbeddedRecord> = if n >= PARALLEL_THRESHOLD {
            (0..n)
                .into_par_iter()
                .map(|row| self.embed_row(table, row, colspec))
                .collect::<Result<Vec<_>>>()?
        } else {
            (0..n)
                .map(|row| self.embed_row(table, row, colspec))
                .collect::<Result<Vec<_>>>()?
        };

        let mut dataset = EmbeddedDataset::new(self.config.fingerprint(), records);
        if update_thresholds {
            threshold::compute_thresholds(&mut dataset, self.config.s(), &self.threshold_config);
        }
        Ok(dataset)
    }

    /// Produces the pairwise SCM similarity matrix between two datasets
    /// embedded under this orchestrator's config (§4.4). Datasets embedded
    /// under a different config fail with `ConfigMismatch`.
    pub fn compare(&self, d1: &EmbeddedDataset, d2: &EmbeddedDataset) -> Result<SimilarityMatrix> {
        similarity::compare(d1, d2, self.config.s())
    }
}
