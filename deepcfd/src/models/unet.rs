//! # DeepCFD Model
//!
//! This module assembles the encoder, bottleneck and decoder heads into the
//! complete model.
//!
//! ## Core Components
//!
//! - `DeepCfdConfig`: A configuration struct to initialize the `DeepCfdNet` model.
//! - `DeepCfdNet`: The model; one input, one named single-channel output per head.
//! - `CfdFields`: The named outputs of a forward pass.
//!
//! Every shape is planned by [`ModelConfig::plan`] before any module is
//! created, so a model that initializes successfully is consistently wired.

use burn::{module::Ignored, prelude::*};
use burn_extra_ops::{SpatialWindow, TensorSpatialOps};

use super::{
    bottleneck::{Bottleneck, BottleneckBlockConfig},
    decoder::{DecoderHead, DecoderHeadConfig, DecoderStageConfig},
    encoder::{EncoderStage, EncoderStageConfig, SkipHandle},
};
use crate::{
    config::{InputPadding, ModelConfig},
    error::{DeepCfdError, DeepCfdResult},
    plan::{ModelSpec, TensorSpec},
};

/// Configuration for the `DeepCfdNet` model.
#[derive(Config, Debug)]
pub struct DeepCfdConfig {
    /// The detailed model configuration.
    pub config: ModelConfig,
}

impl DeepCfdConfig {
    /// Initializes a `DeepCfdNet` model with the given configuration.
    ///
    /// The `device` is the only context the construction depends on; separate
    /// calls build fully independent models.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or its shapes cannot
    /// be reconciled.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> DeepCfdResult<DeepCfdNet<B>> {
        let spec = self.config.plan()?;
        let encoder_config = &self.config.encoder;
        let decoder_config = &self.config.decoder;

        tracing::debug!(
            name = %spec.name,
            input = %spec.input,
            heads = spec.outputs.len(),
            "initializing model"
        );

        let encoder = spec
            .encoder
            .iter()
            .map(|stage| {
                EncoderStageConfig::new(stage.index, stage.in_channels, stage.out_channels)
                    .with_kernel_size(encoder_config.kernel_size)
                    .with_normalize(encoder_config.normalize)
                    .with_pool_policy(encoder_config.pool_policy)
                    .init(device)
            })
            .collect();

        let bottleneck =
            BottleneckBlockConfig::new(spec.bottleneck.in_channels, spec.bottleneck.channels)
                .with_depth(spec.bottleneck.depth)
                .with_kernel_size(encoder_config.kernel_size)
                .with_normalize(encoder_config.normalize)
                .init(device);

        let head_config = DecoderHeadConfig::new(
            spec.decoder
                .iter()
                .map(|stage| {
                    DecoderStageConfig::from_plan(stage, decoder_config)
                        .with_kernel_size(encoder_config.kernel_size)
                        .with_normalize(encoder_config.normalize)
                })
                .collect(),
        );
        let heads = spec
            .outputs
            .iter()
            .map(|output| {
                tracing::debug!(head = %output.name, "initializing decoder head");
                head_config.init(device)
            })
            .collect();

        Ok(DeepCfdNet {
            encoder,
            bottleneck,
            heads,
            padding: Ignored(self.config.padding.clone()),
            spec: Ignored(spec),
        })
    }
}

/// The DeepCFD encoder-decoder network.
#[derive(Module, Debug)]
pub struct DeepCfdNet<B: Backend> {
    encoder: Vec<EncoderStage<B>>,
    bottleneck: Bottleneck<B>,
    pub(crate) heads: Vec<DecoderHead<B>>,
    padding: Ignored<InputPadding>,
    spec: Ignored<ModelSpec>,
}

impl<B: Backend> DeepCfdNet<B> {
    /// Forward pass.
    ///
    /// # Arguments
    ///
    /// * `x` - Input of shape `[batch, channels, height, width]` matching
    ///   [`Self::input_spec`].
    ///
    /// # Returns
    ///
    /// One single-channel map per head, in head order.
    pub fn forward(&self, x: Tensor<B, 4>) -> CfdFields<B> {
        let x = match self.padding.0.amounts() {
            Some(p) => x.pad_spatial([p.top, p.bottom, p.left, p.right], p.value),
            None => x,
        };

        let mut skips: Vec<SkipHandle<B>> = Vec::with_capacity(self.encoder.len());
        let x = self.encoder.iter().fold(x, |x, stage| {
            let (down, skip) = stage.forward(x);
            skips.push(skip);
            down
        });
        let shared = self.bottleneck.forward(x);

        let spec = &self.spec.0;
        let output = spec.output_resolution();
        let window = SpatialWindow::new(
            spec.output_offset.height,
            spec.output_offset.width,
            output.height,
            output.width,
        );

        let fields = self
            .heads
            .iter()
            .zip(&spec.outputs)
            .map(|(head, output)| {
                let field = head.forward(shared.clone(), &skips);
                (output.name.clone(), field.crop_spatial(window))
            })
            .collect();

        CfdFields { fields }
    }

    /// Checks that `x` matches the input descriptor.
    ///
    /// # Errors
    ///
    /// Returns `Err(DeepCfdError::InvalidTensorShape)` on a channel or
    /// resolution mismatch. Any batch size is accepted.
    pub fn check_input(&self, x: &Tensor<B, 4>) -> DeepCfdResult<()> {
        let [batch, channels, height, width] = x.dims();
        let expected = self.input_spec().dims(batch);
        if [batch, channels, height, width] != expected {
            return Err(DeepCfdError::InvalidTensorShape {
                expected: format!("{expected:?}"),
                actual: format!("{:?}", [batch, channels, height, width]),
            });
        }
        Ok(())
    }

    /// The full shape plan the model was built from.
    pub fn spec(&self) -> &ModelSpec {
        &self.spec.0
    }

    pub fn input_spec(&self) -> &TensorSpec {
        &self.spec.0.input
    }

    pub fn output_specs(&self) -> &[TensorSpec] {
        &self.spec.0.outputs
    }

    pub fn num_heads(&self) -> usize {
        self.heads.len()
    }
}

/// Named output fields of a forward pass, in head order.
#[derive(Debug, Clone)]
pub struct CfdFields<B: Backend> {
    fields: Vec<(String, Tensor<B, 4>)>,
}

impl<B: Backend> CfdFields<B> {
    /// The field produced by the head called `name`.
    pub fn get(&self, name: &str) -> Option<&Tensor<B, 4>> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, tensor)| tensor)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor<B, 4>)> {
        self.fields
            .iter()
            .map(|(name, tensor)| (name.as_str(), tensor))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// All fields stacked along the channel axis, in head order.
    pub fn stacked(self) -> Tensor<B, 4> {
        Tensor::cat(self.fields.into_iter().map(|(_, t)| t).collect(), 1)
    }

    pub fn into_vec(self) -> Vec<(String, Tensor<B, 4>)> {
        self.fields
    }
}
