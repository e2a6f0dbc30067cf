//! # Encoder Stages
//!
//! An encoder stage convolves twice at constant resolution, hands the result
//! out as a [`SkipHandle`] and downsamples by two for the next stage.

use burn::{
    nn::pool::{MaxPool2d, MaxPool2dConfig},
    prelude::*,
};
use burn_extra_ops::pad_edge_to_even;

use super::blocks::{ConvBlock, ConvBlockConfig};
use crate::config::PoolPolicy;

/// The pre-downsampling output of an encoder stage.
///
/// Returned by [`EncoderStage::forward`] and passed explicitly to the decoder
/// stage that mirrors it in every head.
#[derive(Debug, Clone)]
pub struct SkipHandle<B: Backend> {
    stage: usize,
    tensor: Tensor<B, 4>,
}

impl<B: Backend> SkipHandle<B> {
    /// Index of the encoder stage that produced this map.
    pub const fn stage(&self) -> usize {
        self.stage
    }

    /// Spatial resolution `[height, width]` of the skip map.
    pub fn resolution(&self) -> [usize; 2] {
        let [_, _, h, w] = self.tensor.dims();
        [h, w]
    }

    /// The skip feature map.
    pub fn tensor(&self) -> Tensor<B, 4> {
        self.tensor.clone()
    }
}

/// 2x max-pool downsampling under a [`PoolPolicy`].
#[derive(Module, Clone, Debug)]
struct Downsample {
    pool: MaxPool2d,
    round_up: bool,
}

impl Downsample {
    fn new(policy: PoolPolicy) -> Self {
        Self {
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            round_up: policy == PoolPolicy::Pad,
        }
    }

    fn forward<B: Backend>(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = if self.round_up { pad_edge_to_even(x) } else { x };
        self.pool.forward(x)
    }
}

/// Configuration for the `EncoderStage` module.
#[derive(Config, Debug)]
pub struct EncoderStageConfig {
    /// Index of the stage, shallowest first.
    index: usize,
    /// Number of input channels.
    in_channels: usize,
    /// Channel width of the stage.
    out_channels: usize,
    #[config(default = "3")]
    kernel_size: usize,
    #[config(default = "true")]
    normalize: bool,
    #[config(default = "PoolPolicy::Pad")]
    pool_policy: PoolPolicy,
}

impl EncoderStageConfig {
    /// Initializes a new `EncoderStage` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> EncoderStage<B> {
        let block = |in_channels| {
            ConvBlockConfig::new(in_channels, self.out_channels)
                .with_kernel_size(self.kernel_size)
                .with_normalize(self.normalize)
                .init(device)
        };

        EncoderStage {
            index: self.index,
            conv1: block(self.in_channels),
            conv2: block(self.out_channels),
            downsample: Downsample::new(self.pool_policy),
        }
    }
}

/// One resolution level of the shared encoder.
#[derive(Module, Debug)]
pub struct EncoderStage<B: Backend> {
    index: usize,
    conv1: ConvBlock<B>,
    conv2: ConvBlock<B>,
    downsample: Downsample,
}

impl<B: Backend> EncoderStage<B> {
    /// Returns the downsampled map for the next stage and the skip handle.
    pub fn forward(&self, x: Tensor<B, 4>) -> (Tensor<B, 4>, SkipHandle<B>) {
        let x = self.conv1.forward(x);
        let skip = self.conv2.forward(x);
        let down = self.downsample.forward(skip.clone());

        (
            down,
            SkipHandle {
                stage: self.index,
                tensor: skip,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn stage(policy: PoolPolicy) -> EncoderStage<TestBackend> {
        EncoderStageConfig::new(1, 3, 8)
            .with_pool_policy(policy)
            .init(&Default::default())
    }

    #[test]
    fn test_pad_policy_rounds_up() {
        let input = Tensor::<TestBackend, 4>::ones([2, 3, 11, 8], &Default::default());
        let (down, skip) = stage(PoolPolicy::Pad).forward(input);

        assert_eq!(down.dims(), [2, 8, 6, 4]);
        assert_eq!(skip.resolution(), [11, 8]);
        assert_eq!(skip.stage(), 1);
        assert_eq!(skip.tensor().dims(), [2, 8, 11, 8]);
    }

    #[test]
    fn test_crop_policy_truncates() {
        let input = Tensor::<TestBackend, 4>::ones([1, 3, 11, 9], &Default::default());
        let (down, skip) = stage(PoolPolicy::Crop).forward(input);

        assert_eq!(down.dims(), [1, 8, 5, 4]);
        assert_eq!(skip.resolution(), [11, 9]);
    }

    #[test]
    fn test_cloned_stage_matches_original() {
        let stage = stage(PoolPolicy::Pad);
        let copy = stage.clone();
        let input = Tensor::<TestBackend, 4>::random(
            [1, 3, 7, 5],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &Default::default(),
        );

        let (down, skip) = stage.forward(input.clone());
        let (copy_down, copy_skip) = copy.forward(input);

        assert_eq!(copy_down.dims(), [1, 8, 4, 3]);
        copy_down
            .into_data()
            .assert_eq(&down.into_data(), true);
        copy_skip
            .tensor()
            .into_data()
            .assert_eq(&skip.tensor().into_data(), true);
    }
}
