// ============================================================
// Layer 4 — Image Dataset
// ============================================================
// Exposes a LabeledImages set through Burn's Dataset trait, one
// ImageItem per image, so the tensor batcher consumes it the
// same way Burn's own vision datasets are consumed.

use burn::data::dataset::Dataset;

use crate::domain::images::{ImageItem, LabeledImages};

impl Dataset<ImageItem> for LabeledImages {
    fn get(&self, index: usize) -> Option<ImageItem> {
        self.item(index)
    }

    fn len(&self) -> usize {
        LabeledImages::len(self)
    }
}
