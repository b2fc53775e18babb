// ============================================================
// Layer 6 — Blob Store
// ============================================================
// Reads and writes the preprocessed dataset splits.
//
// Each split is one bincode-encoded `LabeledImages`. The format is
// private to this crate: blobs are produced by the preprocessing
// step and read back by the mini-batch suppliers, nothing else.

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Serialise `value` to `path`, replacing any previous content.
pub fn save_blob<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;
    }

    let file = File::create(path)
        .with_context(|| format!("Cannot create blob '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, value)
        .with_context(|| format!("Cannot write blob '{}'", path.display()))?;
    writer.flush()?;

    tracing::debug!("Saved blob '{}'", path.display());
    Ok(())
}

/// Deserialise a value previously written by [`save_blob`].
pub fn load_blob<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| {
        format!(
            "Cannot open '{}'. Has the dataset been preprocessed?",
            path.display()
        )
    })?;

    bincode::deserialize_from(BufReader::new(file))
        .with_context(|| format!("Corrupt blob '{}'", path.display()))
}
