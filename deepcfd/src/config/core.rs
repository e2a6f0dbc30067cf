//! Core configuration structures for DeepCFD.
//!
//! This module contains the configuration structures that define the
//! encoder-decoder architecture: the input shape, encoder widths and
//! pooling, bottleneck, decoder heads and optional input padding.

use std::collections::HashSet;

use burn::prelude::*;

use super::enums::*;
use crate::error::{DeepCfdError, DeepCfdResult};

/// Main configuration for a DeepCFD model.
///
/// This struct aggregates all other configuration sections. Every variant of
/// the architecture (normalized or not, resize or transpose upsampling, the two
/// decoder orderings, padded or raw input, one or several heads, with or
/// without skip connections) is a value of this type.
#[derive(Config, Debug)]
pub struct ModelConfig {
    /// Human readable model name.
    #[config(default = "String::from(\"DeepCFD_U-Net\")")]
    pub name: String,
    /// Shape of one input sample.
    #[config(default = "InputConfig::new()")]
    pub input: InputConfig,
    /// Encoder configuration.
    #[config(default = "EncoderConfig::new()")]
    pub encoder: EncoderConfig,
    /// Bottleneck configuration.
    #[config(default = "BottleneckConfig::new()")]
    pub bottleneck: BottleneckConfig,
    /// Decoder and head configuration.
    #[config(default = "DecoderConfig::new()")]
    pub decoder: DecoderConfig,
    /// Padding applied to the input before the encoder.
    #[config(default = "InputPadding::None")]
    pub padding: InputPadding,
}

/// Shape of one input sample.
#[derive(Config, Debug)]
pub struct InputConfig {
    /// Input height in pixels.
    #[config(default = "128")]
    pub height: usize,
    /// Input width in pixels.
    #[config(default = "128")]
    pub width: usize,
    /// Number of input channels (geometry encodings such as an SDF).
    #[config(default = "1")]
    pub channels: usize,
}

/// Encoder configuration.
#[derive(Config, Debug)]
pub struct EncoderConfig {
    /// Channel width of every encoder stage, shallowest first.
    #[config(default = "vec![16, 32, 64]")]
    pub widths: Vec<usize>,
    /// Insert batch normalization after every convolution.
    #[config(default = "true")]
    pub normalize: bool,
    /// Downsampling policy for odd resolutions.
    #[config(default = "PoolPolicy::Pad")]
    pub pool_policy: PoolPolicy,
    /// Convolution kernel size. Must be odd so that convolutions keep the resolution.
    #[config(default = "3")]
    pub kernel_size: usize,
}

/// Bottleneck configuration.
#[derive(Config, Debug)]
pub struct BottleneckConfig {
    /// Channel width. Defaults to the widest encoder width.
    #[config(default = "None")]
    pub width: Option<usize>,
    /// Number of convolution blocks, one or two.
    #[config(default = "1")]
    pub depth: usize,
}

/// Decoder configuration.
#[derive(Config, Debug)]
pub struct DecoderConfig {
    /// Upsampling strategy.
    #[config(default = "Upsample::Nearest")]
    pub upsample: Upsample,
    /// Ordering of convolution and concatenation inside a stage.
    #[config(default = "DecoderOrder::ConcatThenConv")]
    pub order: DecoderOrder,
    /// Concatenate encoder skip maps. Disabling this yields a plain autoencoder.
    #[config(default = "true")]
    pub skip_connections: bool,
    /// One independent head per name, each producing one physical field.
    #[config(default = "vec![String::from(\"u\"), String::from(\"v\"), String::from(\"p\")]")]
    pub heads: Vec<String>,
}

impl EncoderConfig {
    /// Widths doubling from `base` for `stages` stages, e.g. `16 -> [16, 32, 64]`.
    #[must_use]
    pub fn from_base_width(base: usize, stages: usize) -> Self {
        Self::new().with_widths((0..stages).map(|i| base << i).collect())
    }

    /// Number of encoder stages.
    #[must_use]
    pub fn stages(&self) -> usize {
        self.widths.len()
    }
}

impl ModelConfig {
    const MAX_STAGES: usize = 16;

    /// The reference three-head U-Net: velocity `u`, `v` and pressure `p`.
    #[must_use]
    pub fn unet(height: usize, width: usize, channels: usize) -> Self {
        Self::new().with_input(
            InputConfig::new()
                .with_height(height)
                .with_width(width)
                .with_channels(channels),
        )
    }

    /// A single-head U-Net predicting one field.
    #[must_use]
    pub fn single_head(height: usize, width: usize, channels: usize, field: &str) -> Self {
        let model = Self::unet(height, width, channels).with_name("DeepCFD_U-Net_1".to_string());
        let decoder = model.decoder.clone().with_heads(vec![field.to_string()]);
        model.with_decoder(decoder)
    }

    /// A plain autoencoder: the U-Net wiring without skip connections.
    #[must_use]
    pub fn autoencoder(height: usize, width: usize, channels: usize) -> Self {
        let model = Self::unet(height, width, channels).with_name("DeepCFD_AutoEncoder".to_string());
        let decoder = model.decoder.clone().with_skip_connections(false);
        model.with_decoder(decoder)
    }

    /// Pads the input with `value` so that every downsampling step divides evenly.
    #[must_use]
    pub fn with_padding_to_stages(self, value: f32) -> Self {
        let padding = ConstantPadding::to_multiple(
            value,
            self.input.height,
            self.input.width,
            1 << self.encoder.stages().min(Self::MAX_STAGES),
        );
        self.with_padding(InputPadding::Constant(padding))
    }

    /// Channel width of the bottleneck.
    #[must_use]
    pub fn bottleneck_width(&self) -> usize {
        self.bottleneck
            .width
            .or_else(|| self.encoder.widths.last().copied())
            .unwrap_or_default()
    }

    /// Validate the configuration and return appropriate errors for invalid settings.
    ///
    /// Only shape-independent rules are checked here; resolutions are checked
    /// while planning.
    ///
    /// # Errors
    ///
    /// Returns `Err(DeepCfdError::InvalidConfiguration)` if any validation rule is violated.
    pub fn validate(&self) -> DeepCfdResult<()> {
        let input = &self.input;
        if input.height == 0 || input.width == 0 {
            return Err(DeepCfdError::invalid(format!(
                "Input resolution must be positive, got {}x{}",
                input.height, input.width
            )));
        }
        if input.channels == 0 {
            return Err(DeepCfdError::invalid(
                "Input channel count must be at least 1",
            ));
        }

        if self.encoder.widths.is_empty() {
            return Err(DeepCfdError::invalid(
                "Encoder needs at least one stage",
            ));
        }
        if self.encoder.stages() > Self::MAX_STAGES {
            return Err(DeepCfdError::invalid(format!(
                "Encoder supports at most {} stages, got {}",
                Self::MAX_STAGES,
                self.encoder.stages()
            )));
        }
        if let Some(stage) = self.encoder.widths.iter().position(|&w| w == 0) {
            return Err(DeepCfdError::invalid(format!(
                "Encoder stage {stage} has zero channels"
            )));
        }
        if self.encoder.kernel_size == 0 || self.encoder.kernel_size % 2 == 0 {
            return Err(DeepCfdError::invalid(format!(
                "Kernel size must be odd, got {}",
                self.encoder.kernel_size
            )));
        }

        if self.bottleneck_width() == 0 {
            return Err(DeepCfdError::invalid(
                "Bottleneck width must be at least 1",
            ));
        }
        if !(1..=2).contains(&self.bottleneck.depth) {
            return Err(DeepCfdError::invalid(format!(
                "Bottleneck depth must be 1 or 2, got {}",
                self.bottleneck.depth
            )));
        }

        if self.decoder.heads.is_empty() {
            return Err(DeepCfdError::invalid(
                "At least one output head is required",
            ));
        }
        let mut seen = HashSet::with_capacity(self.decoder.heads.len());
        for head in &self.decoder.heads {
            if head.trim().is_empty() {
                return Err(DeepCfdError::invalid("Head names must not be empty"));
            }
            if !seen.insert(head.as_str()) {
                return Err(DeepCfdError::invalid(format!(
                    "Duplicate head name: {head}"
                )));
            }
        }

        if let Some(padding) = self.padding.amounts() {
            if !padding.value.is_finite() {
                return Err(DeepCfdError::invalid(format!(
                    "Padding value must be finite, got {}",
                    padding.value
                )));
            }
        }

        Ok(())
    }
}
