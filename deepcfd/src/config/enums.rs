//! Enumeration types for DeepCFD configuration.
//!
//! Each enum names one independent axis along which the U-Net and autoencoder
//! variants differ. The policy enums can also be parsed from their snake-case
//! names so that command-line tools and JSON files can select them.

use core::str::FromStr;

use burn::prelude::*;

use crate::error::DeepCfdError;

/// Spatial downsampling policy of the encoder stages.
///
/// The two policies produce different resolutions for odd dimensions and are
/// not interchangeable.
#[derive(Config, Debug, Copy, PartialEq, Eq, Hash)]
pub enum PoolPolicy {
    /// Odd dimensions round up: the last row/column is replicated before pooling.
    Pad,
    /// Odd dimensions truncate: the last row/column is dropped by the pooling window.
    Crop,
}

impl PoolPolicy {
    /// Resolution of one spatial axis after a 2x downsampling step.
    #[must_use]
    pub const fn halve(&self, len: usize) -> usize {
        match self {
            Self::Pad => len.div_ceil(2),
            Self::Crop => len / 2,
        }
    }

    /// The policy's canonical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pad => "pad",
            Self::Crop => "crop",
        }
    }
}

impl FromStr for PoolPolicy {
    type Err = DeepCfdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pad" | "ceil" | "same" => Ok(Self::Pad),
            "crop" | "floor" | "valid" => Ok(Self::Crop),
            _ => Err(DeepCfdError::UnsupportedPolicy {
                kind: "downsampling",
                name: s.to_string(),
            }),
        }
    }
}

/// Spatial upsampling strategy of the decoder stages.
#[derive(Config, Debug, Copy, PartialEq, Eq, Hash)]
pub enum Upsample {
    /// Nearest-neighbour resize; keeps the channel count and has no parameters.
    Nearest,
    /// Learned 2x2 transpose convolution with stride 2 to the stage width.
    Transpose,
}

impl Upsample {
    /// The strategy's canonical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Transpose => "transpose",
        }
    }
}

impl FromStr for Upsample {
    type Err = DeepCfdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" | "resize" => Ok(Self::Nearest),
            "transpose" | "conv_transpose" | "deconv" => Ok(Self::Transpose),
            _ => Err(DeepCfdError::UnsupportedPolicy {
                kind: "upsampling",
                name: s.to_string(),
            }),
        }
    }
}

/// Order of the operations inside a decoder stage.
#[derive(Config, Debug, Copy, PartialEq, Eq, Hash)]
pub enum DecoderOrder {
    /// upsample -> concat(skip) -> conv -> conv
    ConcatThenConv,
    /// upsample -> conv -> concat(skip) -> conv
    ConvThenConcat,
}

impl DecoderOrder {
    /// The ordering's canonical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ConcatThenConv => "concat_then_conv",
            Self::ConvThenConcat => "conv_then_concat",
        }
    }
}

impl FromStr for DecoderOrder {
    type Err = DeepCfdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "concat_then_conv" | "post_conv" => Ok(Self::ConcatThenConv),
            "conv_then_concat" | "pre_conv" => Ok(Self::ConvThenConcat),
            _ => Err(DeepCfdError::UnsupportedPolicy {
                kind: "decoder order",
                name: s.to_string(),
            }),
        }
    }
}

/// Constant padding amounts applied to the raw input.
#[derive(Config, Debug, PartialEq)]
pub struct ConstantPadding {
    /// Value written into the padded border.
    #[config(default = "0.0")]
    pub value: f32,
    /// Rows added above the input.
    #[config(default = "0")]
    pub top: usize,
    /// Rows added below the input.
    #[config(default = "0")]
    pub bottom: usize,
    /// Columns added left of the input.
    #[config(default = "0")]
    pub left: usize,
    /// Columns added right of the input.
    #[config(default = "0")]
    pub right: usize,
}

impl ConstantPadding {
    /// Smallest padding that makes `height` and `width` divisible by `multiple`.
    ///
    /// The amount is split between both sides; an odd remainder goes to the
    /// bottom/right side.
    #[must_use]
    pub fn to_multiple(value: f32, height: usize, width: usize, multiple: usize) -> Self {
        let multiple = multiple.max(1);
        let extra = |len: usize| len.div_ceil(multiple) * multiple - len;
        let (dh, dw) = (extra(height), extra(width));

        Self::new()
            .with_value(value)
            .with_top(dh / 2)
            .with_bottom(dh - dh / 2)
            .with_left(dw / 2)
            .with_right(dw - dw / 2)
    }

    /// Total rows added.
    #[must_use]
    pub const fn vertical(&self) -> usize {
        self.top + self.bottom
    }

    /// Total columns added.
    #[must_use]
    pub const fn horizontal(&self) -> usize {
        self.left + self.right
    }
}

/// Input reconciliation applied before the encoder runs.
#[derive(Config, Debug, PartialEq)]
pub enum InputPadding {
    /// The input is fed to the encoder unchanged.
    None,
    /// The input is padded with a constant; outputs are cropped back afterwards.
    Constant(ConstantPadding),
}

impl InputPadding {
    /// Padding amounts, if any.
    #[must_use]
    pub const fn amounts(&self) -> Option<&ConstantPadding> {
        match self {
            Self::None => None,
            Self::Constant(padding) => Some(padding),
        }
    }
}
