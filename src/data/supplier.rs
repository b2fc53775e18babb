// ============================================================
// Layer 4 — Mini-batch Suppliers
// ============================================================
// Lazy, ordered mini-batch sequences over labelled images.
//
//   batch_features_labels          - pair up any image set into
//                                    mini-batches (borrowed or owned)
//   load_preprocess_training_batch - load one preprocessed batch
//                                    file and do the same
//   Cifar10Batches                 - the BatchSupplier the driver
//                                    trains from: per-group training
//                                    batches resized on the fly, plus
//                                    a fixed, already-resized
//                                    validation set
//
// The last mini-batch of a sequence may be smaller than the
// requested size. A batch size of zero yields nothing.

use anyhow::Result;
use std::{
    borrow::Borrow,
    path::{Path, PathBuf},
};

use crate::data::{preprocessor::batch_blob_path, resize::convert_to_imagenet_size};
use crate::domain::{
    images::{LabeledImages, MiniBatch},
    traits::{BatchSupplier, Batches},
};
use crate::infra::blob_store::load_blob;

/// Iterator over consecutive mini-batches of an image set.
pub struct MiniBatches<S> {
    source:     S,
    batch_size: usize,
    cursor:     usize,
}

impl<S: Borrow<LabeledImages>> Iterator for MiniBatches<S> {
    type Item = MiniBatch;

    fn next(&mut self) -> Option<Self::Item> {
        let images = self.source.borrow();
        if self.batch_size == 0 || self.cursor >= images.len() {
            return None;
        }
        let end   = (self.cursor + self.batch_size).min(images.len());
        let batch = images.slice(self.cursor..end);
        self.cursor = end;
        Some(batch)
    }
}

/// Pair up `images` into ordered mini-batches of `batch_size`.
pub fn batch_features_labels<S: Borrow<LabeledImages>>(source: S, batch_size: usize) -> MiniBatches<S> {
    MiniBatches { source, batch_size, cursor: 0 }
}

/// Load training batch `batch_id` from `preprocess_dir` and pair it up into
/// mini-batches of `batch_size`.
pub fn load_preprocess_training_batch(
    preprocess_dir: &Path,
    batch_id:       usize,
    batch_size:     usize,
) -> Result<MiniBatches<LabeledImages>> {
    let images: LabeledImages = load_blob(&batch_blob_path(preprocess_dir, batch_id))?;
    tracing::debug!("Loaded training batch {} ({} images)", batch_id, images.len());
    Ok(batch_features_labels(images, batch_size))
}

// ─── Cifar10Batches ──────────────────────────────────────────────────────────
/// Preprocessed CIFAR-10 as seen by the training driver.
pub struct Cifar10Batches {
    preprocess_dir: PathBuf,
    batch_size:     usize,
    image_side:     usize,
    validation:     LabeledImages,
}

impl Cifar10Batches {
    /// `validation` must already be at the network's input size; training
    /// batches are resized to `image_side` as they are drawn.
    pub fn new(
        preprocess_dir: impl Into<PathBuf>,
        batch_size:     usize,
        image_side:     usize,
        validation:     LabeledImages,
    ) -> Self {
        Self {
            preprocess_dir: preprocess_dir.into(),
            batch_size,
            image_side,
            validation,
        }
    }
}

impl BatchSupplier for Cifar10Batches {
    fn training_batches(&self, group: usize) -> Result<Batches<'_>> {
        let side    = self.image_side;
        let batches = load_preprocess_training_batch(&self.preprocess_dir, group, self.batch_size)?;
        Ok(Box::new(batches.map(move |batch| convert_to_imagenet_size(&batch, side))))
    }

    fn validation_batches(&self) -> Result<Batches<'_>> {
        Ok(Box::new(batch_features_labels(&self.validation, self.batch_size).map(Ok)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::images::ImageShape;
    use crate::infra::blob_store::save_blob;

    /// `count` 2×2 RGB images; image i is filled with i and labelled i % 3.
    fn numbered(count: usize) -> LabeledImages {
        let shape = ImageShape::rgb(2);
        let mut features = Vec::new();
        let mut labels   = Vec::new();
        for i in 0..count {
            features.extend(vec![i as f32; shape.values()]);
            labels.extend((0..3).map(|c| if c == i % 3 { 1.0 } else { 0.0 }));
        }
        LabeledImages::new(shape, 3, features, labels).unwrap()
    }

    #[test]
    fn test_batches_keep_order_with_short_tail() {
        let set   = numbered(5);
        let sizes: Vec<usize> = batch_features_labels(&set, 2).map(|b| b.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);

        let firsts: Vec<f32> = batch_features_labels(&set, 2).map(|b| b.image(0)[0]).collect();
        assert_eq!(firsts, vec![0.0, 2.0, 4.0]);
    }

    #[test]
    fn test_zero_batch_size_yields_nothing() {
        assert_eq!(batch_features_labels(numbered(3), 0).count(), 0);
    }

    #[test]
    fn test_supplier_resizes_training_but_not_validation() {
        let dir = tempfile::tempdir().unwrap();
        save_blob(&batch_blob_path(dir.path(), 1), &numbered(3)).unwrap();

        let validation = convert_to_imagenet_size(&numbered(4), 6).unwrap();
        let supplier   = Cifar10Batches::new(dir.path(), 2, 6, validation);

        let training: Vec<MiniBatch> = supplier
            .training_batches(1)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(training.len(), 2);
        assert!(training.iter().all(|b| b.shape() == ImageShape::rgb(6)));

        // Restartable: a second pass yields the same sequence
        assert_eq!(supplier.training_batches(1).unwrap().count(), 2);
        assert_eq!(supplier.validation_batches().unwrap().count(), 2);
    }

    #[test]
    fn test_missing_group_is_an_error() {
        let dir      = tempfile::tempdir().unwrap();
        let supplier = Cifar10Batches::new(dir.path(), 2, 2, numbered(1));
        assert!(supplier.training_batches(3).is_err());
    }
}
