//! # Decoder Stages and Heads
//!
//! A decoder stage doubles the resolution, reconciles the result with the skip
//! map of the mirrored encoder stage and fuses both by concatenation. A head is
//! an independent stack of decoder stages ending in a 1x1 linear projection to
//! a single physical field.
//!
//! Two stage layouts exist and are kept distinct because they mix receptive
//! fields in a different order:
//!
//! - `ConcatThenConv`: upsample, concat, conv, conv.
//! - `ConvThenConcat`: upsample, conv, concat, conv.

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig},
        PaddingConfig2d,
    },
    prelude::*,
    tensor::{
        module::interpolate,
        ops::{InterpolateMode, InterpolateOptions},
    },
};
use burn_extra_ops::crop_to_match;

use super::{
    blocks::{ConvBlock, ConvBlockConfig},
    encoder::SkipHandle,
};
use crate::{
    config::{DecoderConfig, DecoderOrder, Upsample},
    plan::DecoderStagePlan,
};

/// Parameterless nearest-neighbour 2x resize.
#[derive(Module, Debug, Clone)]
pub struct NearestUpsample;

impl NearestUpsample {
    pub const fn new() -> Self {
        Self
    }

    pub fn forward<B: Backend>(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [_, _, h, w] = x.dims();
        interpolate(
            x,
            [h * 2, w * 2],
            InterpolateOptions::new(InterpolateMode::Nearest),
        )
    }
}

/// An enum to wrap the two upsampling strategies.
#[derive(Module, Debug)]
pub enum Upsampler<B: Backend> {
    Nearest(NearestUpsample),
    Transpose(ConvTranspose2d<B>),
}

impl<B: Backend> Upsampler<B> {
    fn new(kind: Upsample, in_channels: usize, out_channels: usize, device: &Device<B>) -> Self {
        match kind {
            Upsample::Nearest => Self::Nearest(NearestUpsample::new()),
            Upsample::Transpose => Self::Transpose(
                ConvTranspose2dConfig::new([in_channels, out_channels], [2, 2])
                    .with_stride([2, 2])
                    .init(device),
            ),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            Self::Nearest(up) => up.forward(x),
            Self::Transpose(up) => up.forward(x),
        }
    }
}

/// Configuration for the `DecoderStage` module.
#[derive(Config, Debug)]
pub struct DecoderStageConfig {
    /// Index of the mirrored encoder stage.
    index: usize,
    /// Channels of the incoming (lower resolution) map.
    in_channels: usize,
    /// Channels of the upsampled branch where it meets the skip map.
    branch_channels: usize,
    /// Channels contributed by the skip map; zero disables concatenation.
    skip_channels: usize,
    /// Channel width of the stage.
    out_channels: usize,
    #[config(default = "Upsample::Nearest")]
    upsample: Upsample,
    #[config(default = "DecoderOrder::ConcatThenConv")]
    order: DecoderOrder,
    #[config(default = "3")]
    kernel_size: usize,
    #[config(default = "true")]
    normalize: bool,
}

impl DecoderStageConfig {
    /// Configuration matching a planned decoder stage.
    ///
    /// The channel counts are taken from the plan as-is; `decoder` must be the
    /// configuration the plan was made from.
    pub fn from_plan(plan: &DecoderStagePlan, decoder: &DecoderConfig) -> Self {
        Self::new(
            plan.index,
            plan.in_channels,
            plan.branch_channels,
            plan.skip_channels,
            plan.out_channels,
        )
        .with_upsample(decoder.upsample)
        .with_order(decoder.order)
    }

    /// Initializes a new `DecoderStage` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> DecoderStage<B> {
        let block = |in_channels| {
            ConvBlockConfig::new(in_channels, self.out_channels)
                .with_kernel_size(self.kernel_size)
                .with_normalize(self.normalize)
                .init(device)
        };

        let upsample = Upsampler::new(self.upsample, self.in_channels, self.out_channels, device);
        let upsampled_channels = match self.upsample {
            Upsample::Nearest => self.in_channels,
            Upsample::Transpose => self.out_channels,
        };
        let fused_channels = self.branch_channels + self.skip_channels;

        let (pre_concat, post_concat) = match self.order {
            DecoderOrder::ConcatThenConv => (
                None,
                vec![block(fused_channels), block(self.out_channels)],
            ),
            DecoderOrder::ConvThenConcat => {
                (Some(block(upsampled_channels)), vec![block(fused_channels)])
            }
        };

        DecoderStage {
            index: self.index,
            concat_skip: self.skip_channels > 0,
            upsample,
            pre_concat,
            post_concat,
        }
    }
}

/// One resolution level of a decoder head.
#[derive(Module, Debug)]
pub struct DecoderStage<B: Backend> {
    index: usize,
    concat_skip: bool,
    upsample: Upsampler<B>,
    pub(crate) pre_concat: Option<ConvBlock<B>>,
    pub(crate) post_concat: Vec<ConvBlock<B>>,
}

impl<B: Backend> DecoderStage<B> {
    /// Upsamples `x`, reconciles it with `skip` and fuses both.
    ///
    /// Without skip connections the skip map only fixes the target resolution.
    pub fn forward(&self, x: Tensor<B, 4>, skip: &SkipHandle<B>) -> Tensor<B, 4> {
        debug_assert_eq!(skip.stage(), self.index, "skip handle wired to the wrong stage");

        let x = self.upsample.forward(x);
        let x = match &self.pre_concat {
            Some(block) => block.forward(x),
            None => x,
        };

        let (x, skip) = crop_to_match(x, skip.tensor());
        let x = if self.concat_skip {
            Tensor::cat(vec![x, skip], 1)
        } else {
            x
        };

        self.post_concat
            .iter()
            .fold(x, |x, block| block.forward(x))
    }

    /// Channels entering the first convolution after concatenation.
    pub fn fused_channels(&self) -> usize {
        self.post_concat
            .first()
            .map_or(0, ConvBlock::in_channels)
    }
}

/// Configuration for the `DecoderHead` module.
#[derive(Config, Debug)]
pub struct DecoderHeadConfig {
    /// Stage configurations, deepest first.
    stages: Vec<DecoderStageConfig>,
}

impl DecoderHeadConfig {
    /// Initializes a new `DecoderHead` module with freshly allocated parameters.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> DecoderHead<B> {
        let stages: Vec<_> = self.stages.iter().map(|s| s.init(device)).collect();
        let channels = self.stages.last().map_or(1, |s| s.out_channels);
        let projection = Conv2dConfig::new([channels, 1], [1, 1])
            .with_padding(PaddingConfig2d::Valid)
            .init(device);

        DecoderHead { stages, projection }
    }
}

/// An independent decoder branch producing one single-channel field.
#[derive(Module, Debug)]
pub struct DecoderHead<B: Backend> {
    pub(crate) stages: Vec<DecoderStage<B>>,
    pub(crate) projection: Conv2d<B>,
}

impl<B: Backend> DecoderHead<B> {
    /// Decodes the shared bottleneck output.
    ///
    /// `skips` are in encoder order (shallowest first); they are consumed
    /// deepest first.
    pub fn forward(&self, x: Tensor<B, 4>, skips: &[SkipHandle<B>]) -> Tensor<B, 4> {
        let x = self
            .stages
            .iter()
            .zip(skips.iter().rev())
            .fold(x, |x, (stage, skip)| stage.forward(x, skip));

        // Linear activation: the targets are continuous physical quantities.
        self.projection.forward(x)
    }
}
