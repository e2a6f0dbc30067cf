//! # Convolution Blocks
//!
//! The `conv -> [norm] -> ReLU` unit every encoder, bottleneck and decoder
//! stage is assembled from.

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        BatchNorm, BatchNormConfig, PaddingConfig2d, Relu,
    },
    prelude::*,
};
use burn_extra_ops::Identity;

/// An enum to wrap the normalization slot (BatchNorm or Identity).
#[derive(Module, Debug)]
pub(crate) enum NormLayer<B: Backend> {
    BatchNorm(BatchNorm<B, 2>),
    Identity(Identity),
}

impl<B: Backend> NormLayer<B> {
    fn new(channels: usize, normalize: bool, device: &Device<B>) -> Self {
        if normalize {
            Self::BatchNorm(BatchNormConfig::new(channels).init(device))
        } else {
            Self::Identity(Identity::new())
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            Self::BatchNorm(bn) => bn.forward(x),
            Self::Identity(identity) => identity.forward(x),
        }
    }
}

/// Configuration for the `ConvBlock` module.
#[derive(Config, Debug)]
pub struct ConvBlockConfig {
    /// Number of input channels.
    in_channels: usize,
    /// Number of output channels.
    out_channels: usize,
    /// Square kernel size; odd sizes keep the resolution.
    #[config(default = "3")]
    kernel_size: usize,
    /// Use batch normalization between convolution and activation.
    #[config(default = "true")]
    normalize: bool,
}

impl ConvBlockConfig {
    /// Initializes a new `ConvBlock` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> ConvBlock<B> {
        let pad = self.kernel_size / 2;
        let conv = Conv2dConfig::new(
            [self.in_channels, self.out_channels],
            [self.kernel_size, self.kernel_size],
        )
        .with_stride([1, 1])
        .with_padding(PaddingConfig2d::Explicit(pad, pad))
        .init(device);

        ConvBlock {
            conv,
            norm: NormLayer::new(self.out_channels, self.normalize, device),
            relu: Relu::new(),
        }
    }
}

/// A 'same' convolution followed by optional batch normalization and ReLU.
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    pub(crate) conv: Conv2d<B>,
    norm: NormLayer<B>,
    relu: Relu,
}

impl<B: Backend> ConvBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.norm.forward(x);
        self.relu.forward(x)
    }

    /// Number of channels the block expects.
    pub fn in_channels(&self) -> usize {
        self.conv.weight.dims()[1]
    }

    /// Number of channels the block produces.
    pub fn out_channels(&self) -> usize {
        self.conv.weight.dims()[0]
    }
}
