// ============================================================
// Layer 4 — Resize to Network Input
// ============================================================
// CIFAR-10 images are 32×32 but the network expects 224×224
// (the ImageNet input size). Each image is wrapped as an f32 RGB
// image buffer and resized with bilinear filtering; labels are
// carried over untouched.

use anyhow::{ensure, Context, Result};
use image::{
    imageops::{self, FilterType},
    ImageBuffer, Rgb,
};

use crate::domain::images::{ImageShape, LabeledImages};

/// Input side length of the network.
pub const IMAGENET_SIDE: usize = 224;

/// Resize every image in `images` to `side`×`side`.
pub fn convert_to_imagenet_size(images: &LabeledImages, side: usize) -> Result<LabeledImages> {
    let source = images.shape();
    ensure!(source.channels == 3, "resizing needs RGB images, got {source:?}");

    let target = ImageShape::rgb(side);
    if source == target {
        return Ok(images.clone());
    }

    let mut features = Vec::with_capacity(images.len() * target.values());
    for index in 0..images.len() {
        let buffer: ImageBuffer<Rgb<f32>, Vec<f32>> = ImageBuffer::from_raw(
            source.width as u32,
            source.height as u32,
            images.image(index).to_vec(),
        )
        .with_context(|| format!("image {index} does not fill a {source:?} buffer"))?;

        let resized = imageops::resize(&buffer, side as u32, side as u32, FilterType::Triangle);
        features.extend_from_slice(resized.as_raw());
    }

    LabeledImages::new(target, images.num_classes(), features, images.labels().to_vec())
}
