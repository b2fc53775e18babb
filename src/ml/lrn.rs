// ============================================================
// Layer 5 — Local Response Normalisation
// ============================================================

use burn::prelude::*;

/// Cross-channel local response normalisation.
///
/// `out[c] = x[c] / (bias + alpha * Σ x[c']²) ^ beta` where the sum runs over
/// channels `c'` within `depth_radius` of `c`. Channels past either edge
/// count as zero. `alpha` is not divided by the window size.
#[derive(Config, Debug)]
pub struct LocalResponseNormConfig {
    #[config(default = 5)]
    pub depth_radius: usize,
    #[config(default = 2.0)]
    pub bias: f64,
    #[config(default = 1e-4)]
    pub alpha: f64,
    #[config(default = 0.75)]
    pub beta: f64,
}

impl LocalResponseNormConfig {
    pub fn init(&self) -> LocalResponseNorm {
        LocalResponseNorm {
            depth_radius: self.depth_radius,
            bias:         self.bias,
            alpha:        self.alpha,
            beta:         self.beta,
        }
    }
}

#[derive(Module, Clone, Debug)]
pub struct LocalResponseNorm {
    pub depth_radius: usize,
    pub bias:         f64,
    pub alpha:        f64,
    pub beta:         f64,
}

impl LocalResponseNorm {
    /// x: [batch, channels, height, width] → same shape
    pub fn forward<B: Backend>(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [batch, channels, height, width] = x.dims();
        let device  = x.device();
        let squared = x.clone() * x.clone();

        let window_sum = if self.depth_radius == 0 {
            squared
        } else {
            // Zero-pad the channel axis so every window is full width.
            let r   = self.depth_radius;
            let pad = Tensor::<B, 4>::zeros([batch, r, height, width], &device);
            let padded = Tensor::cat(vec![pad.clone(), squared, pad], 1);

            let empty  = Tensor::<B, 4>::zeros([batch, channels, height, width], &device);

            (0..=2 * r).fold(empty, |sum, offset| {
                sum + padded
                    .clone()
                    .slice([0..batch, offset..offset + channels, 0..height, 0..width])
            })
        };

        let scale = window_sum
            .mul_scalar(self.alpha)
            .add_scalar(self.bias)
            .powf_scalar(self.beta);
        x / scale
    }
}
