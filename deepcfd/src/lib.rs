//! # DeepCFD-Burn
//!
//! Parameterized U-Net and autoencoder builders that predict steady-state
//! flow fields (velocity `u`, `v` and pressure `p`) from geometry encodings.
//!
//! A [`ModelConfig`] describes one architecture variant. [`ModelConfig::plan`]
//! resolves every shape without allocating parameters and
//! [`DeepCfdConfig::init`] builds the network on a device:
//!
//! ```no_run
//! use burn::backend::NdArray;
//! use deepcfd_burn::{DeepCfdConfig, ModelConfig};
//!
//! let config = ModelConfig::unet(172, 79, 3).with_padding_to_stages(0.0);
//! let model = DeepCfdConfig::new(config)
//!     .init::<NdArray>(&Default::default())
//!     .unwrap();
//! assert_eq!(model.output_specs().len(), 3);
//! ```

mod config;
mod error;
mod models;
mod plan;

pub use config::*;
pub use error::{DeepCfdError, DeepCfdResult};
pub use models::{CfdFields, DeepCfdConfig, DeepCfdNet, DeepCfdNetRecord, SkipHandle};
pub use plan::{
    max_reconcile_offset, reconcile, BottleneckPlan, DecoderStagePlan, EncoderStagePlan,
    ModelSpec, Resolution, TensorSpec,
};
