// ============================================================
// Layer 4 — CIFAR-10 Preprocessor
// ============================================================
// Turns raw CIFAR-10 batch files into the splits training reads.
//
// For every record:
//   1. Scale pixel bytes into [0, 1]        (x / 255)
//   2. Reorder planar CHW into interleaved HWC
//   3. One-hot encode the label over 10 classes
//
// Then for every training batch file i:
//   - first 90% → preprocess_batch_{i}.p
//   - last 10%  → appended to preprocess_validation.p
// and the test batch → preprocess_testing.p
//
// Blobs are only rebuilt when one of them is missing.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::data::cifar10::{self, CifarRecord, IMAGE_SHAPE, NUM_CLASSES, TRAINING_BATCHES};
use crate::domain::images::{ImageShape, LabeledImages};
use crate::infra::blob_store::save_blob;

/// Share of each training batch held out for validation.
const VALIDATION_FRACTION: f64 = 0.1;

pub const VALIDATION_FILE: &str = "preprocess_validation.p";
pub const TESTING_FILE:    &str = "preprocess_testing.p";

pub fn batch_blob_path(out_dir: &Path, batch_id: usize) -> PathBuf {
    out_dir.join(format!("preprocess_batch_{batch_id}.p"))
}

pub fn validation_blob_path(out_dir: &Path) -> PathBuf {
    out_dir.join(VALIDATION_FILE)
}

pub fn testing_blob_path(out_dir: &Path) -> PathBuf {
    out_dir.join(TESTING_FILE)
}

/// Scale raw pixel bytes into [0, 1].
pub fn normalize(pixels: &[u8]) -> Vec<f32> {
    pixels.iter().map(|&p| p as f32 / 255.0).collect()
}

/// Reorder one planar (CHW) image into interleaved (HWC) order.
pub fn planar_to_interleaved(planar: &[f32], shape: ImageShape) -> Vec<f32> {
    let plane = shape.height * shape.width;
    let mut out = Vec::with_capacity(planar.len());
    for pixel in 0..plane {
        for channel in 0..shape.channels {
            out.push(planar[channel * plane + pixel]);
        }
    }
    out
}

/// One-hot row for `label`.
pub fn one_hot(label: usize, num_classes: usize) -> Vec<f32> {
    let mut row = vec![0.0; num_classes];
    row[label] = 1.0;
    row
}

/// Normalise, reorder and one-hot encode a run of records.
pub fn records_to_images(records: &[CifarRecord]) -> Result<LabeledImages> {
    let mut features = Vec::with_capacity(records.len() * IMAGE_SHAPE.values());
    let mut labels   = Vec::with_capacity(records.len() * NUM_CLASSES);

    for record in records {
        features.extend(planar_to_interleaved(&normalize(&record.pixels), IMAGE_SHAPE));
        labels.extend(one_hot(record.label as usize, NUM_CLASSES));
    }

    LabeledImages::new(IMAGE_SHAPE, NUM_CLASSES, features, labels)
}

/// Split `images` into (training, validation) keeping order; the
/// validation part is the last `VALIDATION_FRACTION` of the set.
pub fn split_validation(images: &LabeledImages) -> (LabeledImages, LabeledImages) {
    let total     = images.len();
    let held_out  = (total as f64 * VALIDATION_FRACTION) as usize;
    let split_at  = total - held_out;
    (images.slice(0..split_at), images.slice(split_at..total))
}

fn outputs(out_dir: &Path) -> Vec<PathBuf> {
    (1..=TRAINING_BATCHES)
        .map(|i| batch_blob_path(out_dir, i))
        .chain([validation_blob_path(out_dir), testing_blob_path(out_dir)])
        .collect()
}

/// Preprocess every CIFAR-10 batch in `dataset_dir` and persist the splits
/// into `out_dir`.
pub fn preprocess_and_save_data(dataset_dir: &Path, out_dir: &Path) -> Result<()> {
    if outputs(out_dir).iter().all(|p| p.exists()) {
        tracing::info!("Preprocessed splits already present in '{}'", out_dir.display());
        return Ok(());
    }

    let mut validation = LabeledImages::empty(IMAGE_SHAPE, NUM_CLASSES);

    for batch_id in 1..=TRAINING_BATCHES {
        let records = cifar10::read_batch(&cifar10::training_path(dataset_dir, batch_id))?;
        let images  = records_to_images(&records)?;
        let (train, valid) = split_validation(&images);

        tracing::debug!(
            "Batch {}: {} training, {} validation images",
            batch_id,
            train.len(),
            valid.len()
        );
        save_blob(&batch_blob_path(out_dir, batch_id), &train)?;
        validation.append(&valid)?;
    }

    tracing::debug!("Validation images per class: {:?}", validation.class_counts());
    save_blob(&validation_blob_path(out_dir), &validation)?;

    let test = records_to_images(&cifar10::read_batch(&cifar10::test_path(dataset_dir))?)?;
    save_blob(&testing_blob_path(out_dir), &test)?;

    tracing::info!(
        "Preprocessed CIFAR-10: {} validation images, {} test images",
        validation.len(),
        test.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::blob_store::load_blob;

    fn record(label: u8, red: u8) -> CifarRecord {
        // Red plane filled with `red`, green 0, blue 255
        let mut pixels = vec![red; 1024];
        pixels.extend(vec![0; 1024]);
        pixels.extend(vec![255; 1024]);
        CifarRecord { label, pixels }
    }

    fn write_batch(path: &Path, records: &[CifarRecord]) {
        let bytes: Vec<u8> = records
            .iter()
            .flat_map(|r| std::iter::once(r.label).chain(r.pixels.iter().copied()))
            .collect();
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_normalize_scales_to_unit_range() {
        assert_eq!(normalize(&[0, 255, 51]), vec![0.0, 1.0, 0.2]);
    }

    #[test]
    fn test_planar_becomes_interleaved() {
        // 1×2 image, 3 channels: R=[1,2] G=[3,4] B=[5,6]
        let planar = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let out    = planar_to_interleaved(&planar, ImageShape::new(1, 2, 3));
        assert_eq!(out, vec![1.0, 3.0, 5.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_records_become_one_hot_hwc_images() {
        let images = records_to_images(&[record(4, 255)]).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images.class_of(0), 4);
        assert_eq!(&images.image(0)[..3], &[1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_split_holds_out_last_tenth() {
        let records: Vec<CifarRecord> = (0..20).map(|i| record(i % 10, 0)).collect();
        let (train, valid) = split_validation(&records_to_images(&records).unwrap());
        assert_eq!(train.len(), 18);
        assert_eq!(valid.len(), 2);
        assert_eq!(valid.class_of(0), 8);
        assert_eq!(valid.class_of(1), 9);
    }

    #[test]
    fn test_preprocess_writes_every_split() {
        let raw = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();

        let records: Vec<CifarRecord> = (0..10).map(|i| record(i, 10)).collect();
        for batch_id in 1..=TRAINING_BATCHES {
            write_batch(&cifar10::training_path(raw.path(), batch_id), &records);
        }
        write_batch(&cifar10::test_path(raw.path()), &records[..3]);

        preprocess_and_save_data(raw.path(), out.path()).unwrap();

        let batch: LabeledImages = load_blob(&batch_blob_path(out.path(), 2)).unwrap();
        let valid: LabeledImages = load_blob(&validation_blob_path(out.path())).unwrap();
        let test:  LabeledImages = load_blob(&testing_blob_path(out.path())).unwrap();
        assert_eq!(batch.len(), 9);
        assert_eq!(valid.len(), TRAINING_BATCHES);
        assert_eq!(test.len(), 3);
        assert!(valid.features().iter().all(|v| (0.0..=1.0).contains(v)));
    }
}
