//! Convolutional steering regressor.
//!
//! Input is the cropped frame from the augmentor, [batch, 3, 60, 300] in
//! [0, 1]. The forward pass rescales to [-1, 1], runs two strided conv +
//! max-pool stages, and regresses a single steering value through three
//! ELU-activated dense layers with dropout after the first.

use burn::module::Module;
use burn::nn;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::types::{INPUT_CHANNELS, INPUT_HEIGHT, INPUT_WIDTH};

/// Flattened feature count after conv1/pool/conv2/pool on the 60x300 input:
/// 60x300 -> 29x149 -> 14x74 -> 6x36 -> 3x18, times 36 channels.
const FLATTEN_DIM: usize = 36 * 3 * 18;

#[derive(Debug, Clone)]
pub struct SteeringNetConfig {
    /// Dropout probability after the first dense layer.
    pub dropout: f64,
}

impl Default for SteeringNetConfig {
    fn default() -> Self {
        Self { dropout: 0.25 }
    }
}

#[derive(Debug, Module)]
pub struct SteeringNet<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    pool: MaxPool2d,
    fc1: nn::Linear<B>,
    dropout: nn::Dropout,
    fc2: nn::Linear<B>,
    fc3: nn::Linear<B>,
    head: nn::Linear<B>,
}

impl<B: Backend> SteeringNet<B> {
    pub fn new(cfg: SteeringNetConfig, device: &B::Device) -> Self {
        let conv1 = Conv2dConfig::new([INPUT_CHANNELS, 24], [3, 3])
            .with_stride([2, 2])
            .init(device);
        let conv2 = Conv2dConfig::new([24, 36], [3, 3])
            .with_stride([2, 2])
            .init(device);
        let pool = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();
        let fc1 = nn::LinearConfig::new(FLATTEN_DIM, 1024).init(device);
        let dropout = nn::DropoutConfig::new(cfg.dropout).init();
        let fc2 = nn::LinearConfig::new(1024, 128).init(device);
        let fc3 = nn::LinearConfig::new(128, 50).init(device);
        let head = nn::LinearConfig::new(50, 1).init(device);
        Self {
            conv1,
            conv2,
            pool,
            fc1,
            dropout,
            fc2,
            fc3,
            head,
        }
    }

    /// [batch, 3, INPUT_HEIGHT, INPUT_WIDTH] in [0, 1] -> [batch, 1].
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        debug_assert_eq!(
            &images.dims()[1..],
            &[INPUT_CHANNELS, INPUT_HEIGHT as usize, INPUT_WIDTH as usize]
        );
        let x = images.mul_scalar(2.0).sub_scalar(1.0);
        let x = self.pool.forward(elu(self.conv1.forward(x)));
        let x = self.pool.forward(elu(self.conv2.forward(x)));
        let [batch, c, h, w] = x.dims();
        let x = x.reshape([batch, c * h * w]);
        let x = self.dropout.forward(elu(self.fc1.forward(x)));
        let x = elu(self.fc2.forward(x));
        let x = elu(self.fc3.forward(x));
        self.head.forward(x)
    }
}

/// ELU activation; burn ships none, so it is built from tensor ops.
fn elu<B: Backend, const D: usize>(x: Tensor<B, D>) -> Tensor<B, D> {
    x.clone().clamp_min(0.0) + x.clamp_max(0.0).exp().sub_scalar(1.0)
}
