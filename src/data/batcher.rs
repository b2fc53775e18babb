// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Implements Burn's Batcher trait to stack ImageItems into
// tensors on the target device.
//
// How batching works here:
//   Input:  N items, each an HWC pixel Vec<f32> and a one-hot row
//   Output: images  [N, C, H, W]  (Burn convolutions are NCHW)
//           targets [N, classes]
//
//   Pixels are concatenated into one [N, H, W, C] buffer and then
//   permuted on the device.
//
// Generic over the backend so the same batcher feeds both the
// autodiff model (training) and the inner model (validation).

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::domain::images::{ImageItem, ImageShape};

/// A mini-batch ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct ClassificationBatch<B: Backend> {
    /// Shape: [batch_size, channels, height, width]
    pub images: Tensor<B, 4>,

    /// One-hot targets, shape: [batch_size, num_classes]
    pub targets: Tensor<B, 2>,
}

/// Holds the target device so tensors are created on the correct GPU/CPU.
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<ImageItem, ClassificationBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<ImageItem>) -> ClassificationBatch<B> {
        let count   = items.len();
        let shape   = items.first().map(|i| i.shape).unwrap_or(ImageShape::new(0, 0, 0));
        let classes = items.first().map(|i| i.label.len()).unwrap_or(0);

        let pixels: Vec<f32> = items.iter().flat_map(|i| i.pixels.iter().copied()).collect();
        let labels: Vec<f32> = items.iter().flat_map(|i| i.label.iter().copied()).collect();

        let images = Tensor::<B, 4>::from_data(
            TensorData::new(pixels, [count, shape.height, shape.width, shape.channels]),
            &self.device,
        )
        .permute([0, 3, 1, 2]);

        let targets = Tensor::<B, 2>::from_data(
            TensorData::new(labels, [count, classes]),
            &self.device,
        );

        ClassificationBatch { images, targets }
    }
}
