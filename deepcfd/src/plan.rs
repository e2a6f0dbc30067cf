//! # Shape Planning
//!
//! Backend-independent shape inference for a [`ModelConfig`]. The planner walks
//! the encoder, bottleneck and decoder exactly the way the model is wired and
//! records the resolution and channel count at every point. All shape errors
//! surface here, before any parameter is allocated.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    config::{DecoderOrder, ModelConfig, Upsample},
    error::{DeepCfdError, DeepCfdResult},
};

/// Largest per-axis difference that cropping may remove at a decoder stage
/// with `stages_below` downsampling steps underneath it.
///
/// Each truncating 2x step loses at most one row/column, and the loss doubles
/// on the way back up, so a consistent graph never exceeds `2^stages_below - 1`.
pub const fn max_reconcile_offset(stages_below: usize) -> usize {
    (1 << stages_below) - 1
}

/// Spatial resolution of a feature map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub height: usize,
    pub width: usize,
}

impl Resolution {
    pub const fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    /// Resolution after a 2x upsampling step.
    pub const fn doubled(&self) -> Self {
        Self::new(self.height * 2, self.width * 2)
    }

    pub const fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.height, self.width)
    }
}

/// Descriptor of a model input or output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TensorSpec {
    pub name: String,
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl TensorSpec {
    pub fn new(name: impl Into<String>, resolution: Resolution, channels: usize) -> Self {
        Self {
            name: name.into(),
            height: resolution.height,
            width: resolution.width,
            channels,
        }
    }

    pub const fn resolution(&self) -> Resolution {
        Resolution::new(self.height, self.width)
    }

    /// Burn tensor dimensions `[batch, channels, height, width]` for this descriptor.
    pub const fn dims(&self, batch: usize) -> [usize; 4] {
        [batch, self.channels, self.height, self.width]
    }
}

impl fmt::Display for TensorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: ({}, {}, {})",
            self.name, self.height, self.width, self.channels
        )
    }
}

/// Planned shapes of one encoder stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderStagePlan {
    pub index: usize,
    pub in_channels: usize,
    pub out_channels: usize,
    /// Resolution of the skip map (before downsampling).
    pub skip: Resolution,
    /// Resolution handed to the next stage.
    pub pooled: Resolution,
}

/// Planned shapes of the shared bottleneck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BottleneckPlan {
    pub in_channels: usize,
    pub channels: usize,
    pub depth: usize,
    pub resolution: Resolution,
}

/// Planned shapes of one decoder stage. Identical for every head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderStagePlan {
    /// Index of the mirrored encoder stage.
    pub index: usize,
    pub in_channels: usize,
    /// Channels of the upsampled branch where it meets the skip map.
    pub branch_channels: usize,
    /// Channels contributed by the skip map; zero without skip connections.
    pub skip_channels: usize,
    /// Channels after concatenation.
    pub fused_channels: usize,
    pub out_channels: usize,
    pub upsampled: Resolution,
    pub skip: Resolution,
    /// Common resolution after cropping.
    pub fused: Resolution,
}

/// The full shape plan of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    pub input: TensorSpec,
    /// Resolution entering the encoder, after input padding.
    pub padded: Resolution,
    pub encoder: Vec<EncoderStagePlan>,
    pub bottleneck: BottleneckPlan,
    pub decoder: Vec<DecoderStagePlan>,
    /// Resolution leaving the last decoder stage.
    pub decoded: Resolution,
    /// Top-left corner of the output window inside the decoded map.
    pub output_offset: Resolution,
    pub outputs: Vec<TensorSpec>,
}

impl ModelSpec {
    /// Resolution shared by all outputs.
    pub fn output_resolution(&self) -> Resolution {
        self.outputs
            .first()
            .map_or(self.decoded, TensorSpec::resolution)
    }

    pub fn head_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|output| output.name.as_str())
    }
}

/// Common resolution of an upsampled map and its skip map.
///
/// The larger map on each axis is cropped to the smaller one, anchored at the
/// top-left corner.
///
/// # Errors
///
/// Returns `Err(DeepCfdError::ShapeMismatch)` if either axis differs by more
/// than `max_offset`.
pub fn reconcile(
    location: &str,
    upsampled: Resolution,
    skip: Resolution,
    max_offset: usize,
) -> DeepCfdResult<Resolution> {
    let fits = |a: usize, b: usize| a.abs_diff(b) <= max_offset;
    if !fits(upsampled.height, skip.height) || !fits(upsampled.width, skip.width) {
        return Err(DeepCfdError::ShapeMismatch {
            location: location.to_string(),
            expected: skip.to_string(),
            actual: upsampled.to_string(),
        });
    }

    Ok(Resolution::new(
        upsampled.height.min(skip.height),
        upsampled.width.min(skip.width),
    ))
}

impl ModelConfig {
    /// Plans every shape of the model without allocating any parameters.
    ///
    /// # Errors
    ///
    /// Returns `Err(DeepCfdError::InvalidConfiguration)` if the configuration is
    /// invalid or the input is too small for the number of stages, and
    /// `Err(DeepCfdError::ShapeMismatch)` if a skip map or the output window
    /// cannot be reconciled.
    pub fn plan(&self) -> DeepCfdResult<ModelSpec> {
        self.validate()?;

        let requested = Resolution::new(self.input.height, self.input.width);
        let input = TensorSpec::new("input", requested, self.input.channels);
        let padded = match self.padding.amounts() {
            Some(p) => Resolution::new(
                requested.height + p.vertical(),
                requested.width + p.horizontal(),
            ),
            None => requested,
        };

        let policy = self.encoder.pool_policy;
        let mut encoder = Vec::with_capacity(self.encoder.stages());
        let mut resolution = padded;
        let mut channels = self.input.channels;
        for (index, &width) in self.encoder.widths.iter().enumerate() {
            let pooled = Resolution::new(
                policy.halve(resolution.height),
                policy.halve(resolution.width),
            );
            if pooled.is_empty() {
                return Err(DeepCfdError::invalid(format!(
                    "Input {padded} is too small for {} encoder stages with {} pooling",
                    self.encoder.stages(),
                    policy.as_str()
                )));
            }
            tracing::debug!(stage = index, skip = %resolution, %pooled, width, "planned encoder stage");
            encoder.push(EncoderStagePlan {
                index,
                in_channels: channels,
                out_channels: width,
                skip: resolution,
                pooled,
            });
            resolution = pooled;
            channels = width;
        }

        let bottleneck = BottleneckPlan {
            in_channels: channels,
            channels: self.bottleneck_width(),
            depth: self.bottleneck.depth,
            resolution,
        };
        tracing::debug!(resolution = %resolution, channels = bottleneck.channels, "planned bottleneck");

        let mut decoder = Vec::with_capacity(encoder.len());
        let mut channels = bottleneck.channels;
        for stage in encoder.iter().rev() {
            let width = stage.out_channels;
            let upsampled = resolution.doubled();
            let location = format!("decoder stage {}", stage.index);
            let max_offset = max_reconcile_offset(encoder.len() - stage.index);
            let fused = reconcile(&location, upsampled, stage.skip, max_offset)?;

            let upsampled_channels = match self.decoder.upsample {
                Upsample::Nearest => channels,
                Upsample::Transpose => width,
            };
            let branch_channels = match self.decoder.order {
                DecoderOrder::ConcatThenConv => upsampled_channels,
                DecoderOrder::ConvThenConcat => width,
            };
            let skip_channels = if self.decoder.skip_connections {
                width
            } else {
                0
            };
            tracing::debug!(stage = stage.index, %upsampled, skip = %stage.skip, %fused, "planned decoder stage");

            decoder.push(DecoderStagePlan {
                index: stage.index,
                in_channels: channels,
                branch_channels,
                skip_channels,
                fused_channels: branch_channels + skip_channels,
                out_channels: width,
                upsampled,
                skip: stage.skip,
                fused,
            });
            resolution = fused;
            channels = width;
        }
        let decoded = resolution;

        let (output_offset, output) = match self.padding.amounts() {
            Some(p) => {
                let needed = Resolution::new(p.top + requested.height, p.left + requested.width);
                if decoded.height < needed.height || decoded.width < needed.width {
                    return Err(DeepCfdError::ShapeMismatch {
                        location: "output crop".to_string(),
                        expected: format!("at least {needed}"),
                        actual: decoded.to_string(),
                    });
                }
                (Resolution::new(p.top, p.left), requested)
            }
            None => {
                if decoded != requested {
                    tracing::warn!(
                        requested = %requested,
                        decoded = %decoded,
                        policy = policy.as_str(),
                        "output resolution is truncated by the pooling policy"
                    );
                }
                (Resolution::new(0, 0), decoded)
            }
        };

        let outputs = self
            .decoder
            .heads
            .iter()
            .map(|name| TensorSpec::new(name.clone(), output, 1))
            .collect();

        Ok(ModelSpec {
            name: self.name.clone(),
            input,
            padded,
            encoder,
            bottleneck,
            decoder,
            decoded,
            output_offset,
            outputs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        BottleneckConfig, ConstantPadding, DecoderConfig, EncoderConfig, InputPadding, PoolPolicy,
    };

    fn with_pool(config: ModelConfig, policy: PoolPolicy) -> ModelConfig {
        let encoder = config.encoder.clone().with_pool_policy(policy);
        config.with_encoder(encoder)
    }

    #[test]
    fn test_reference_unet_plan() {
        let spec = ModelConfig::unet(128, 128, 1).plan().unwrap();

        assert_eq!(spec.input.dims(1), [1, 1, 128, 128]);
        assert_eq!(spec.bottleneck.resolution, Resolution::new(16, 16));
        assert_eq!(spec.bottleneck.channels, 64);
        assert_eq!(spec.outputs.len(), 3);
        for (output, name) in spec.outputs.iter().zip(["u", "v", "p"]) {
            assert_eq!(output.name, name);
            assert_eq!((output.height, output.width, output.channels), (128, 128, 1));
        }
    }

    #[test]
    fn test_divisible_inputs_keep_resolution() {
        for (h, w) in [(8, 8), (16, 32), (64, 24), (256, 128)] {
            for policy in [PoolPolicy::Pad, PoolPolicy::Crop] {
                let spec = with_pool(ModelConfig::unet(h, w, 2), policy).plan().unwrap();
                assert_eq!(spec.output_resolution(), Resolution::new(h, w));
                assert_eq!(spec.decoded, Resolution::new(h, w));
            }
        }
    }

    #[test]
    fn test_pad_policy_keeps_odd_resolution() {
        let spec = ModelConfig::unet(37, 51, 1).plan().unwrap();

        let pooled: Vec<_> = spec.encoder.iter().map(|s| s.pooled).collect();
        assert_eq!(
            pooled,
            vec![
                Resolution::new(19, 26),
                Resolution::new(10, 13),
                Resolution::new(5, 7)
            ]
        );
        assert_eq!(spec.output_resolution(), Resolution::new(37, 51));
        for stage in &spec.decoder {
            assert_eq!(stage.fused, stage.skip);
        }
    }

    #[test]
    fn test_crop_policy_truncates_unpadded_output() {
        let spec = with_pool(ModelConfig::unet(37, 51, 1), PoolPolicy::Crop)
            .plan()
            .unwrap();

        assert_eq!(spec.bottleneck.resolution, Resolution::new(4, 6));
        assert_eq!(spec.output_resolution(), Resolution::new(32, 48));
    }

    #[test]
    fn test_asymmetric_padding_scenario() {
        let padding = ConstantPadding::new()
            .with_top(2)
            .with_bottom(2)
            .with_left(2)
            .with_right(3);
        let config = ModelConfig::unet(172, 79, 3).with_padding(InputPadding::Constant(padding));

        let spec = config.plan().unwrap();
        assert_eq!(spec.padded, Resolution::new(176, 84));
        assert_eq!(spec.bottleneck.resolution, Resolution::new(22, 11));
        assert_eq!(spec.output_offset, Resolution::new(2, 2));
        for output in &spec.outputs {
            assert_eq!(output.resolution(), Resolution::new(172, 79));
        }

        match with_pool(config, PoolPolicy::Crop).plan() {
            Err(DeepCfdError::ShapeMismatch { location, .. }) => {
                assert_eq!(location, "output crop");
            }
            other => panic!("Expected ShapeMismatch error, got {other:?}"),
        }
    }

    #[test]
    fn test_padding_to_stages() {
        let config = ModelConfig::unet(172, 79, 3).with_padding_to_stages(-1.0);
        let padding = config.padding.amounts().unwrap();
        assert_eq!((padding.top, padding.bottom), (2, 2));
        assert_eq!((padding.left, padding.right), (0, 1));

        let spec = with_pool(config, PoolPolicy::Crop).plan().unwrap();
        assert_eq!(spec.padded, Resolution::new(176, 80));
        assert_eq!(spec.bottleneck.resolution, Resolution::new(22, 10));
        assert_eq!(spec.output_resolution(), Resolution::new(172, 79));
    }

    #[test]
    fn test_fused_channels_are_branch_plus_skip() {
        let orders = [DecoderOrder::ConcatThenConv, DecoderOrder::ConvThenConcat];
        let upsamples = [Upsample::Nearest, Upsample::Transpose];
        for order in orders {
            for upsample in upsamples {
                let config = ModelConfig::unet(64, 64, 1).with_decoder(
                    DecoderConfig::new()
                        .with_order(order)
                        .with_upsample(upsample),
                );
                let spec = config.plan().unwrap();
                for stage in &spec.decoder {
                    assert_eq!(
                        stage.fused_channels,
                        stage.branch_channels + stage.skip_channels
                    );
                    assert_eq!(stage.skip_channels, spec.encoder[stage.index].out_channels);
                }
            }
        }

        let spec = ModelConfig::unet(64, 64, 1).plan().unwrap();
        let fused: Vec<_> = spec.decoder.iter().map(|s| s.fused_channels).collect();
        assert_eq!(fused, vec![64 + 64, 64 + 32, 32 + 16]);
    }

    #[test]
    fn test_autoencoder_has_no_skip_channels() {
        let spec = ModelConfig::autoencoder(32, 32, 1).plan().unwrap();
        assert!(spec.decoder.iter().all(|s| s.skip_channels == 0));
        assert_eq!(spec.output_resolution(), Resolution::new(32, 32));
    }

    #[test]
    fn test_custom_bottleneck_width() {
        let config = ModelConfig::unet(32, 32, 1)
            .with_encoder(EncoderConfig::from_base_width(8, 2))
            .with_bottleneck(BottleneckConfig::new().with_width(Some(40)).with_depth(2));
        let spec = config.plan().unwrap();

        assert_eq!(spec.encoder.len(), 2);
        assert_eq!(spec.bottleneck.in_channels, 16);
        assert_eq!(spec.bottleneck.channels, 40);
        assert_eq!(spec.decoder[0].in_channels, 40);
    }

    #[test]
    fn test_too_small_input_is_rejected() {
        let config = with_pool(ModelConfig::unet(4, 64, 1), PoolPolicy::Crop);
        assert!(matches!(
            config.plan(),
            Err(DeepCfdError::InvalidConfiguration { .. })
        ));

        // Pad rounds up, so a single row survives every stage.
        let spec = ModelConfig::unet(1, 64, 1).plan().unwrap();
        assert_eq!(spec.output_resolution(), Resolution::new(1, 64));
    }

    #[test]
    fn test_reconcile() {
        let r = Resolution::new;
        assert_eq!(reconcile("s", r(22, 22), r(21, 22), 1).unwrap(), r(21, 22));
        assert_eq!(reconcile("s", r(20, 40), r(21, 41), 1).unwrap(), r(20, 40));
        assert_eq!(reconcile("s", r(32, 48), r(37, 51), 7).unwrap(), r(32, 48));

        match reconcile("decoder stage 1", r(24, 24), r(21, 24), 1) {
            Err(DeepCfdError::ShapeMismatch {
                location,
                expected,
                actual,
            }) => {
                assert_eq!(location, "decoder stage 1");
                assert_eq!(expected, "21x24");
                assert_eq!(actual, "24x24");
            }
            other => panic!("Expected ShapeMismatch error, got {other:?}"),
        }
    }

    #[test]
    fn test_max_reconcile_offset() {
        assert_eq!(max_reconcile_offset(1), 1);
        assert_eq!(max_reconcile_offset(2), 3);
        assert_eq!(max_reconcile_offset(3), 7);
    }

    #[test]
    fn test_plan_is_deterministic() {
        let config = ModelConfig::unet(172, 79, 3).with_padding_to_stages(0.0);
        assert_eq!(config.plan().unwrap(), config.plan().unwrap());
    }
}
