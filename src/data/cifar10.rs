// ============================================================
// Layer 4 — CIFAR-10 Source Files
// ============================================================
// Fetches the CIFAR-10 binary archive and parses its batch files.
//
// Binary format (one record per image, no header):
//   byte 0        - label (0..=9)
//   bytes 1..3073 - pixels, planar: 1024 red, 1024 green, 1024 blue,
//                   each plane row-major 32×32
//
// Files: data_batch_1.bin … data_batch_5.bin, test_batch.bin

use anyhow::{ensure, Context, Result};
use flate2::read::GzDecoder;
use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
};
use tar::Archive;

use crate::domain::images::ImageShape;

const CIFAR10_URL: &str = "https://www.cs.toronto.edu/~kriz/cifar-10-binary.tar.gz";

/// Folder the archive is unpacked into when no dataset path is given.
pub const CIFAR10_FOLDER: &str = "cifar-10-batches-bin";

pub const NUM_CLASSES:     usize = 10;
pub const TRAINING_BATCHES: usize = 5;
pub const IMAGE_SHAPE:     ImageShape = ImageShape::rgb(32);

const RECORD_LEN: usize = 1 + 32 * 32 * 3;
const TEST_FILE:  &str  = "test_batch.bin";

/// One raw image: label plus planar (CHW) pixel bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct CifarRecord {
    pub label:  u8,
    pub pixels: Vec<u8>,
}

/// File name of training batch `batch_id` (1-based).
pub fn training_file(batch_id: usize) -> String {
    format!("data_batch_{batch_id}.bin")
}

fn expected_files() -> Vec<String> {
    (1..=TRAINING_BATCHES)
        .map(training_file)
        .chain(std::iter::once(TEST_FILE.to_string()))
        .collect()
}

pub fn training_path(folder: &Path, batch_id: usize) -> PathBuf {
    folder.join(training_file(batch_id))
}

pub fn test_path(folder: &Path) -> PathBuf {
    folder.join(TEST_FILE)
}

/// Make sure `folder` holds every CIFAR-10 batch file, downloading and
/// unpacking the archive only when one is missing.
pub fn download(folder: &Path) -> Result<()> {
    let missing: Vec<String> = expected_files()
        .into_iter()
        .filter(|name| !folder.join(name).exists())
        .collect();

    if missing.is_empty() {
        tracing::info!("CIFAR-10 already present in '{}'", folder.display());
        return Ok(());
    }
    tracing::info!(
        "Downloading CIFAR-10 into '{}' ({} files missing)",
        folder.display(),
        missing.len()
    );

    fs::create_dir_all(folder)
        .with_context(|| format!("Cannot create dataset folder '{}'", folder.display()))?;

    let bytes = reqwest::blocking::get(CIFAR10_URL)
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.bytes())
        .with_context(|| format!("Failed to download '{CIFAR10_URL}'"))?;
    tracing::debug!("Downloaded {} bytes", bytes.len());

    unpack_archive(&bytes[..], folder)
}

/// Unpack the six batch files of a gzipped CIFAR-10 tarball flat into
/// `folder`. The archive nests them under `cifar-10-batches-bin/`; other
/// entries are skipped. Fails if any batch file is absent afterwards.
pub fn unpack_archive(reader: impl Read, folder: &Path) -> Result<()> {
    let wanted = expected_files();
    let mut archive = Archive::new(GzDecoder::new(reader));
    for entry in archive.entries().context("Corrupt CIFAR-10 archive")? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if wanted.iter().any(|w| w == name) {
            let target = folder.join(name);
            entry
                .unpack(&target)
                .with_context(|| format!("Cannot write '{}'", target.display()))?;
        }
    }

    let still_missing: Vec<String> = wanted
        .into_iter()
        .filter(|name| !folder.join(name).exists())
        .collect();
    ensure!(
        still_missing.is_empty(),
        "CIFAR-10 archive did not contain {still_missing:?}"
    );
    Ok(())
}

/// Split the contents of one batch file into records.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<CifarRecord>> {
    ensure!(
        bytes.len() % RECORD_LEN == 0,
        "CIFAR-10 batch of {} bytes is not a whole number of {RECORD_LEN}-byte records",
        bytes.len()
    );

    bytes
        .chunks_exact(RECORD_LEN)
        .map(|chunk| {
            let label = chunk[0];
            ensure!(
                (label as usize) < NUM_CLASSES,
                "label {label} is outside 0..{NUM_CLASSES}"
            );
            Ok(CifarRecord { label, pixels: chunk[1..].to_vec() })
        })
        .collect()
}

/// Read and parse one batch file from disk.
pub fn read_batch(path: &Path) -> Result<Vec<CifarRecord>> {
    let bytes = fs::read(path)
        .with_context(|| format!("Cannot read CIFAR-10 batch '{}'", path.display()))?;
    parse_records(&bytes).with_context(|| format!("Corrupt CIFAR-10 batch '{}'", path.display()))
}
