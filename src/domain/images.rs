// ============================================================
// Layer 3 — Labelled Images
// ============================================================
// A set of images stored channels-last (HWC) in one flat buffer,
// paired with one-hot label rows in a second flat buffer.
//
// The same type serves three roles:
//   - a persisted split (a whole preprocessed batch file)
//   - the validation subset kept in memory during training
//   - a mini-batch handed to a single optimizer step
//
// The one invariant enforced on construction: features and labels
// describe the same number of images.

use std::ops::Range;

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Height, width and channel count of a single image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageShape {
    pub height:   usize,
    pub width:    usize,
    pub channels: usize,
}

impl ImageShape {
    pub const fn new(height: usize, width: usize, channels: usize) -> Self {
        Self { height, width, channels }
    }

    /// Square RGB image, e.g. `ImageShape::rgb(224)`.
    pub const fn rgb(side: usize) -> Self {
        Self::new(side, side, 3)
    }

    /// Number of f32 values one image occupies.
    pub const fn values(&self) -> usize {
        self.height * self.width * self.channels
    }
}

/// Images plus one-hot labels, both flattened row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LabeledImagesRecord")]
pub struct LabeledImages {
    shape:       ImageShape,
    num_classes: usize,
    features:    Vec<f32>,
    labels:      Vec<f32>,
}

// Deserialised blobs go through the same checks as `new`.
#[derive(Deserialize)]
struct LabeledImagesRecord {
    shape:       ImageShape,
    num_classes: usize,
    features:    Vec<f32>,
    labels:      Vec<f32>,
}

impl TryFrom<LabeledImagesRecord> for LabeledImages {
    type Error = anyhow::Error;

    fn try_from(r: LabeledImagesRecord) -> Result<Self> {
        Self::new(r.shape, r.num_classes, r.features, r.labels)
    }
}

/// One optimizer step's worth of images.
pub type MiniBatch = LabeledImages;

/// A single image with its one-hot label, as handed to the tensor batcher.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageItem {
    pub shape:  ImageShape,
    pub pixels: Vec<f32>,
    pub label:  Vec<f32>,
}

impl LabeledImages {
    /// Build a set from flat buffers.
    ///
    /// Fails if either buffer is not a whole number of rows, or if the
    /// two buffers disagree on how many images they hold.
    pub fn new(
        shape:       ImageShape,
        num_classes: usize,
        features:    Vec<f32>,
        labels:      Vec<f32>,
    ) -> Result<Self> {
        ensure!(shape.values() > 0, "image shape {shape:?} has no pixels");
        ensure!(num_classes > 0, "label rows need at least one class");
        ensure!(
            features.len() % shape.values() == 0,
            "feature buffer of {} values is not a whole number of {:?} images",
            features.len(),
            shape,
        );
        ensure!(
            labels.len() % num_classes == 0,
            "label buffer of {} values is not a whole number of {}-class rows",
            labels.len(),
            num_classes,
        );

        let images = features.len() / shape.values();
        let rows   = labels.len() / num_classes;
        ensure!(
            images == rows,
            "features hold {images} images but labels hold {rows} rows"
        );

        Ok(Self { shape, num_classes, features, labels })
    }

    /// An empty set that later splits can be appended to.
    pub fn empty(shape: ImageShape, num_classes: usize) -> Self {
        Self { shape, num_classes, features: Vec::new(), labels: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.features.len() / self.shape.values()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn shape(&self) -> ImageShape {
        self.shape
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn features(&self) -> &[f32] {
        &self.features
    }

    pub fn labels(&self) -> &[f32] {
        &self.labels
    }

    /// HWC values of image `index`.
    pub fn image(&self, index: usize) -> &[f32] {
        let n = self.shape.values();
        &self.features[index * n..(index + 1) * n]
    }

    /// One-hot row of image `index`.
    pub fn label(&self, index: usize) -> &[f32] {
        let n = self.num_classes;
        &self.labels[index * n..(index + 1) * n]
    }

    /// Owned copy of image `index`, or `None` past the end.
    pub fn item(&self, index: usize) -> Option<ImageItem> {
        (index < self.len()).then(|| ImageItem {
            shape:  self.shape,
            pixels: self.image(index).to_vec(),
            label:  self.label(index).to_vec(),
        })
    }

    /// Class index of image `index` (position of the largest label value).
    pub fn class_of(&self, index: usize) -> usize {
        self.label(index)
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
            .0
    }

    /// Number of images per class.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.num_classes];
        for i in 0..self.len() {
            counts[self.class_of(i)] += 1;
        }
        counts
    }

    /// Copy of the images in `range`.
    pub fn slice(&self, range: Range<usize>) -> Self {
        let (n, k) = (self.shape.values(), self.num_classes);
        Self {
            shape:       self.shape,
            num_classes: self.num_classes,
            features:    self.features[range.start * n..range.end * n].to_vec(),
            labels:      self.labels[range.start * k..range.end * k].to_vec(),
        }
    }

    /// Keep at most the first `count` images.
    pub fn truncate(&mut self, count: usize) {
        let count = count.min(self.len());
        self.features.truncate(count * self.shape.values());
        self.labels.truncate(count * self.num_classes);
    }

    /// Append every image of `other`; both sets must share shape and classes.
    pub fn append(&mut self, other: &LabeledImages) -> Result<()> {
        ensure!(
            self.shape == other.shape && self.num_classes == other.num_classes,
            "cannot append {:?}/{} images to a {:?}/{} set",
            other.shape,
            other.num_classes,
            self.shape,
            self.num_classes,
        );
        self.features.extend_from_slice(&other.features);
        self.labels.extend_from_slice(&other.labels);
        Ok(())
    }
}
