//! Privacy-preserving record linkage core.
//!
//! Transforms tabular records from two independent datasets into
//! fixed-length Bloom filter signatures and performs threshold-aware
//! one-to-one matching between them using the Soft Cosine Measure. This
//! crate is a library: synchronous, side-effect-free beyond constructing its
//! output objects, and silent (it writes no logs of its own; a calling CLI
//! or service decides how to surface errors and progress).
//!
//! The public surface is small and composes in the order the five
//! components below are listed:
//!
//! 1. [`extractors`]: pure `(value, label) -> FeatureBag` functions, plus
//!    the [`extractors::FeatureFactory`] registry a caller assembles them
//!    into.
//! 2. [`bloom`]: double-hashes a record's feature bag into a sparse set of
//!    Bloom filter bit positions.
//! 3. [`threshold`]: derives each record's per-row match-acceptability
//!    threshold from its dataset's self-similarity distribution.
//! 4. [`similarity`]: the pairwise Soft Cosine Measure matrix between two
//!    embedded datasets.
//! 5. [`matcher`]: one-to-one assignment over that matrix via the
//!    Kuhn-Munkres algorithm.
//!
//! [`engine::Embedder`] is the thin orchestrator wiring these together
//! behind `embed`/`compare`; `match` is a method on the resulting
//! [`similarity::SimilarityMatrix`].

mod blob;
mod bloom;
mod dataset_io;
mod embedder_config;
mod engine;
mod error;
mod extractors;
mod matcher;
mod metaphone;
mod record;
mod scm;
mod shingle;
mod similarity;
mod table;
mod threshold;

pub use blob::{EmbedderBlob, ExtractorSpec};
pub use dataset_io::{read_jsonl, write_jsonl};
pub use embedder_config::{EmbedderConfig, TokenSimilarityMatrix};
pub use engine::Embedder;
pub use error::{LinkageError, Result};
pub use extractors::{
    DatePreference, DobExtractor, FeatureExtractor, FeatureFactory, NameExtractor, SexExtractor,
    ShingledExtractor, TokenExtractor, NAME_LABEL,
};
pub use matcher::Matching;
pub use record::{EmbeddedDataset, EmbeddedRecord, FeatureBagDebug};
pub use scm::{norm, scm};
pub use shingle::{FeatureBag, Shingle};
pub use similarity::SimilarityMatrix;
pub use table::{ColumnMapping, ColumnSpec, RowTable, Table};
pub use threshold::ThresholdConfig;
