// ============================================================
// Layer 5 — AlexNet Model
// ============================================================
// Five convolutional layers and three fully-connected layers,
// all VALID padded, for square RGB input (224×224 by default).
//
//   conv1 11×11/4 → ReLU → LRN → maxpool 3/2
//   conv2 5×5     → ReLU → LRN → maxpool 3/2
//   conv3 3×3 → conv4 3×3 → conv5 3×3 → maxpool 3/2
//   fc6 → dropout → fc7 → dropout → output logits
//
// Reference: Krizhevsky et al. (2012)

use anyhow::{Context, Result};
use burn::{
    module::Param,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig, Initializer, Linear, LinearConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::{log_softmax, relu},
};

use crate::ml::lrn::{LocalResponseNorm, LocalResponseNormConfig};

// (kernel, stride) of every spatial layer, in order. All use VALID padding.
const SPATIAL_LAYERS: [(usize, usize); 8] = [
    (11, 4), // conv1
    (3, 2),  // pool1
    (5, 1),  // conv2
    (3, 2),  // pool2
    (3, 1),  // conv3
    (3, 1),  // conv4
    (3, 1),  // conv5
    (3, 2),  // pool5
];

const CONV5_CHANNELS: usize = 256;

/// Width of the flattened conv5 output for a square `image_side` input, or
/// `None` if the image is too small to survive every VALID layer.
pub fn flattened_features(image_side: usize) -> Option<usize> {
    let side = SPATIAL_LAYERS.iter().try_fold(image_side, |size, &(kernel, stride)| {
        size.checked_sub(kernel).map(|rest| rest / stride + 1)
    })?;
    Some(side * side * CONV5_CHANNELS)
}

#[derive(Config, Debug)]
pub struct AlexNetConfig {
    pub num_classes: usize,
    #[config(default = 224)]
    pub image_side: usize,
    /// Width of the two fully-connected hidden layers.
    #[config(default = 4096)]
    pub hidden: usize,
    /// Drop probability after each hidden layer.
    #[config(default = 0.5)]
    pub dropout: f64,
}

impl AlexNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<AlexNet<B>> {
        let flat = flattened_features(self.image_side).with_context(|| {
            format!("{}×{} input is too small for AlexNet", self.image_side, self.image_side)
        })?;
        let lrn  = LocalResponseNormConfig::new();
        let pool = MaxPool2dConfig::new([3, 3]).with_strides([2, 2]);

        Ok(AlexNet {
            conv1:   conv([3, 96], 11, 4, 0.0, device),
            lrn1:    lrn.init(),
            pool1:   pool.init(),
            conv2:   conv([96, 256], 5, 1, 1.0, device),
            lrn2:    lrn.init(),
            pool2:   pool.init(),
            conv3:   conv([256, 384], 3, 1, 0.0, device),
            conv4:   conv([384, 384], 3, 1, 1.0, device),
            conv5:   conv([384, CONV5_CHANNELS], 3, 1, 1.0, device),
            pool5:   pool.init(),
            fc6:     dense(flat, self.hidden, 1.0, device),
            fc7:     dense(self.hidden, self.hidden, 1.0, device),
            output:  dense(self.hidden, self.num_classes, 0.0, device),
            dropout: DropoutConfig::new(self.dropout).init(),
        })
    }
}

fn conv<B: Backend>(
    channels: [usize; 2],
    kernel:   usize,
    stride:   usize,
    bias:     f32,
    device:   &B::Device,
) -> Conv2d<B> {
    let mut layer = Conv2dConfig::new(channels, [kernel, kernel])
        .with_stride([stride, stride])
        .with_padding(PaddingConfig2d::Valid)
        .with_initializer(Initializer::XavierUniform { gain: 1.0 })
        .init(device);
    layer.bias = Some(Param::from_tensor(Tensor::full([channels[1]], bias, device)));
    layer
}

fn dense<B: Backend>(inputs: usize, outputs: usize, bias: f32, device: &B::Device) -> Linear<B> {
    let mut layer = LinearConfig::new(inputs, outputs)
        .with_initializer(Initializer::XavierUniform { gain: 1.0 })
        .init(device);
    layer.bias = Some(Param::from_tensor(Tensor::full([outputs], bias, device)));
    layer
}

#[derive(Module, Debug)]
pub struct AlexNet<B: Backend> {
    pub conv1:   Conv2d<B>,
    pub lrn1:    LocalResponseNorm,
    pub pool1:   MaxPool2d,
    pub conv2:   Conv2d<B>,
    pub lrn2:    LocalResponseNorm,
    pub pool2:   MaxPool2d,
    pub conv3:   Conv2d<B>,
    pub conv4:   Conv2d<B>,
    pub conv5:   Conv2d<B>,
    pub pool5:   MaxPool2d,
    pub fc6:     Linear<B>,
    pub fc7:     Linear<B>,
    pub output:  Linear<B>,
    pub dropout: Dropout,
}

impl<B: Backend> AlexNet<B> {
    /// images: [batch, 3, side, side] → logits: [batch, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = relu(self.conv1.forward(images));
        let x = self.pool1.forward(self.lrn1.forward(x));

        let x = relu(self.conv2.forward(x));
        let x = self.pool2.forward(self.lrn2.forward(x));

        let x = relu(self.conv3.forward(x));
        let x = relu(self.conv4.forward(x));
        let x = self.pool5.forward(relu(self.conv5.forward(x)));

        let x = x.flatten::<2>(1, 3);
        let x = self.dropout.forward(relu(self.fc6.forward(x)));
        let x = self.dropout.forward(relu(self.fc7.forward(x)));
        self.output.forward(x)
    }

    /// Forward pass plus mean softmax cross-entropy against one-hot `targets`.
    pub fn forward_loss(
        &self,
        images:  Tensor<B, 4>,
        targets: Tensor<B, 2>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(images);
        let loss   = softmax_cross_entropy(logits.clone(), targets);
        (loss, logits)
    }
}

/// Mean over the batch of `-Σ target · log_softmax(logits)`.
pub fn softmax_cross_entropy<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    (log_softmax(logits, 1) * targets).sum_dim(1).mean().neg()
}

/// Fraction of rows whose argmax matches the target's argmax.
pub fn accuracy<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    logits.argmax(1).equal(targets.argmax(1)).float().mean()
}
