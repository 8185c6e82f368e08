//! The embedder blob (§6): a self-describing, versioned artifact that lets
//! both parties in a linkage project exchange the same `EmbedderConfig` and
//! feature-factory registry without relying on language-native object
//! serialization (§9, *serialized embedder via object pickling*).
//!
//! Framing follows the same extension-sniffed gzip convention this crate's
//! lineage already uses for its bulk serialized artifacts
//! (`examples/jmviz-wety/processor/src/processed.rs`'s `serialize`/
//! `deserialize`): a `.gz` path (or an explicit `gzip: true` for the in-memory
//! variant) compresses, anything else doesn't.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::embedder_config::EmbedderConfig;
use crate::error::{LinkageError, Result};
use crate::extractors::{
    DatePreference, DobExtractor, FeatureExtractor, FeatureFactory, NameExtractor, SexExtractor,
    ShingledExtractor, TokenExtractor,
};

/// Current blob format version. Bumped whenever the on-disk layout changes
/// incompatibly; a mismatch is surfaced as `SerializationError` rather than
/// silently misinterpreting bytes (§6 expansion).
const BLOB_FORMAT_VERSION: u32 = 1;

/// The construction parameters of one registered extractor, captured so the
/// whole feature factory, not just the `EmbedderConfig`, round-trips
/// through the blob (§4.1, §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExtractorSpec {
    Name,
    Dob { preference: DatePreference },
    Sex,
    Token { label_override: Option<String> },
    Shingle { lengths: Vec<usize>, label_override: Option<String> },
}

impl ExtractorSpec {
    fn build(&self) -> Arc<dyn FeatureExtractor> {
        match self {
            Self::Name => Arc::new(NameExtractor),
            Self::Dob { preference } => Arc::new(DobExtractor {
                preference: *preference,
            }),
            Self::Sex => Arc::new(SexExtractor),
            Self::Token { label_override } => Arc::new(TokenExtractor {
                label_override: label_override.clone(),
            }),
            Self::Shingle {
                lengths,
                label_override,
            } => Arc::new(ShingledExtractor {
                lengths: lengths.clone(),
                label_override: label_override.clone(),
            }),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct BlobBody {
    format_version: u32,
    config: EmbedderConfig,
    extractors: Vec<(String, ExtractorSpec)>,
}

/// The opaque cross-party artifact of §6: an `EmbedderConfig` plus the named
/// `ExtractorSpec`s that reconstruct an identical `FeatureFactory`.
pub struct EmbedderBlob {
    body: BlobBody,
}

impl EmbedderBlob {
    #[must_use]
    pub fn new(config: EmbedderConfig, extractors: Vec<(String, ExtractorSpec)>) -> Self {
        Self {
            body: BlobBody {
                format_version: BLOB_FORMAT_VERSION,
                config,
                extractors,
            },
        }
    }

    /// A blob carrying the catalogue's default extractors under their
    /// conventional type names (mirrors [`FeatureFactory::with_defaults`]).
    #[must_use]
    pub fn with_default_extractors(config: EmbedderConfig) -> Self {
        Self::new(
            config,
            vec![
                ("name".to_string(), ExtractorSpec::Name),
                (
                    "dob".to_string(),
                    ExtractorSpec::Dob {
                        preference: DatePreference::DayFirst,
                    },
                ),
                ("sex".to_string(), ExtractorSpec::Sex),
                (
                    "token".to_string(),
                    ExtractorSpec::Token {
                        label_override: None,
                    },
                ),
                (
                    "shingle".to_string(),
                    ExtractorSpec::Shingle {
                        lengths: vec![2, 3],
                        label_override: None,
                    },
                ),
            ],
        )
    }

    #[must_use]
    pub fn config(&self) -> &EmbedderConfig {
        &self.body.config
    }

    #[must_use]
    pub fn extractor_specs(&self) -> &[(String, ExtractorSpec)] {
        &self.body.extractors
    }

    /// Reconstructs the `FeatureFactory` this blob describes.
    #[must_use]
    pub fn to_feature_factory(&self) -> FeatureFactory {
        let mut factory = FeatureFactory::new();
        for (type_name, spec) in &self.body.extractors {
            factory.register(type_name.clone(), spec.build());
        }
        factory
    }

    /// Serializes to bytes, optionally gzip-compressed.
    pub fn to_bytes(&self, gzip: bool) -> Result<Vec<u8>> {
        if gzip {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
            serde_json::to_writer(&mut encoder, &self.body)?;
            Ok(encoder.finish()?)
        } else {
            Ok(serde_json::to_vec(&self.body)?)
        }
    }

    /// Deserializes from bytes, auto-detecting gzip framing from the magic
    /// bytes `1f 8b` rather than requiring the caller to remember how it was
    /// written.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let is_gzipped = bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b;
        let body: BlobBody = if is_gzipped {
            serde_json::from_reader(GzDecoder::new(bytes))?
        } else {
            serde_json::from_slice(bytes)?
        };
        if body.format_version != BLOB_FORMAT_VERSION {
            return Err(LinkageError::SerializationError(format!(
                "unsupported blob format version {} (expected {})",
                body.format_version, BLOB_FORMAT_VERSION
            )));
        }
        Ok(Self { body })
    }

    /// Writes to `path`, gzip-compressing iff the extension is `.gz`
    /// (the same extension-sniffed convention as `processed.rs`).
    pub fn write(&self, path: &Path) -> Result<()> {
        let should_gzip = path.extension().is_some_and(|ext| ext == "gz");
        let file = File::create(path)?;
        let mut writer: Box<dyn Write> = if should_gzip {
            Box::new(GzEncoder::new(file, Compression::fast()))
        } else {
            Box::new(BufWriter::new(file))
        };
        serde_json::to_writer(&mut writer, &self.body)?;
        writer.flush()?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let is_gzipped = path.extension().is_some_and(|ext| ext == "gz");
        let body: BlobBody = if is_gzipped {
            serde_json::from_reader(GzDecoder::new(reader))?
        } else {
            serde_json::from_reader(reader)?
        };
        if body.format_version != BLOB_FORMAT_VERSION {
            return Err(LinkageError::SerializationError(format!(
                "unsupported blob format version {} (expected {})",
                body.format_version, BLOB_FORMAT_VERSION
            )));
        }
        Ok(Self { body })
    }
}
