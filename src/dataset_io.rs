//! Row-oriented serialization for an [`EmbeddedDataset`] (§6): one JSON
//! object per record, one record per line. The dataset-level
//! `EmbedderConfig` identity isn't part of this per-record wire format (§6
//! gives the per-record shape, not the framing); callers pair a JSON-lines
//! dataset with the [`crate::blob::EmbedderBlob`] that produced it and
//! supply that config's fingerprint back on read.

use std::io::{BufRead, Write};

use crate::error::Result;
use crate::record::{EmbeddedDataset, EmbeddedRecord};

/// Writes `dataset` as JSON-lines, one [`EmbeddedRecord`] per line.
pub fn write_jsonl<W: Write>(mut writer: W, dataset: &EmbeddedDataset) -> Result<()> {
    for record in dataset.records() {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Reads a JSON-lines stream of [`EmbeddedRecord`]s back into an
/// [`EmbeddedDataset`] carrying `config_fingerprint`. Blank lines are
/// skipped so trailing newlines round-trip cleanly.
pub fn read_jsonl<R: BufRead>(reader: R, config_fingerprint: u64) -> Result<EmbeddedDataset> {
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: EmbeddedRecord = serde_json::from_str(&line)?;
        records.push(record);
    }
    Ok(EmbeddedDataset::new(config_fingerprint, records))
}
