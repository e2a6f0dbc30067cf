//! Shared command-line arguments for the demos.

use std::{fs, path::PathBuf, str::FromStr};

use anyhow::{Context, Result};
use clap::Args;
use deepcfd_burn::{
    BottleneckConfig, DecoderConfig, DecoderOrder, EncoderConfig, InputConfig, ModelConfig,
    PoolPolicy, Upsample,
};
use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber honouring `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Architecture description shared by every demo.
#[derive(Args, Debug, Clone)]
pub struct ArchitectureArgs {
    /// JSON model configuration; when given, all other architecture flags are ignored
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Input height
    #[arg(long, default_value_t = 172)]
    pub height: usize,

    /// Input width
    #[arg(long, default_value_t = 79)]
    pub width: usize,

    /// Input channels
    #[arg(long, default_value_t = 3)]
    pub channels: usize,

    /// Encoder widths, shallowest first
    #[arg(long, value_delimiter = ',', default_value = "16,32,64")]
    pub widths: Vec<usize>,

    /// Bottleneck width (defaults to the last encoder width)
    #[arg(long)]
    pub bottleneck_width: Option<usize>,

    /// Number of bottleneck convolutions (1 or 2)
    #[arg(long, default_value_t = 1)]
    pub bottleneck_depth: usize,

    /// Convolution kernel size
    #[arg(long, default_value_t = 3)]
    pub kernel_size: usize,

    /// Downsampling policy for odd resolutions (pad, crop)
    #[arg(long, default_value = "pad", value_parser = PoolPolicy::from_str)]
    pub pool: PoolPolicy,

    /// Upsampling strategy (nearest, transpose)
    #[arg(long, default_value = "nearest", value_parser = Upsample::from_str)]
    pub upsample: Upsample,

    /// Decoder stage ordering (concat_then_conv, conv_then_concat)
    #[arg(long, default_value = "concat_then_conv", value_parser = DecoderOrder::from_str)]
    pub order: DecoderOrder,

    /// Disable batch normalization
    #[arg(long)]
    pub no_norm: bool,

    /// Disable skip connections (plain autoencoder)
    #[arg(long)]
    pub no_skip: bool,

    /// Output head names
    #[arg(long, value_delimiter = ',', default_value = "u,v,p")]
    pub heads: Vec<String>,

    /// Pad the input with this value so that every stage divides evenly
    #[arg(long)]
    pub pad_value: Option<f32>,
}

impl ArchitectureArgs {
    /// Builds the model configuration described by the arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed.
    pub fn to_config(&self) -> Result<ModelConfig> {
        if let Some(path) = &self.config {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let config: ModelConfig = serde_json::from_str(&json)
                .with_context(|| format!("failed to parse model config {}", path.display()))?;
            tracing::info!(path = %path.display(), name = %config.name, "loaded model config");
            return Ok(config);
        }

        let name = if self.no_skip {
            "DeepCFD_AutoEncoder"
        } else {
            "DeepCFD_U-Net"
        };
        let config = ModelConfig::new()
            .with_name(name.to_string())
            .with_input(
                InputConfig::new()
                    .with_height(self.height)
                    .with_width(self.width)
                    .with_channels(self.channels),
            )
            .with_encoder(
                EncoderConfig::new()
                    .with_widths(self.widths.clone())
                    .with_normalize(!self.no_norm)
                    .with_pool_policy(self.pool)
                    .with_kernel_size(self.kernel_size),
            )
            .with_bottleneck(
                BottleneckConfig::new()
                    .with_width(self.bottleneck_width)
                    .with_depth(self.bottleneck_depth),
            )
            .with_decoder(
                DecoderConfig::new()
                    .with_upsample(self.upsample)
                    .with_order(self.order)
                    .with_skip_connections(!self.no_skip)
                    .with_heads(self.heads.clone()),
            );

        Ok(match self.pad_value {
            Some(value) => config.with_padding_to_stages(value),
            None => config,
        })
    }
}
