//! # Model Architectures
//!
//! This module aggregates the building blocks of the DeepCFD networks:
//!
//! - `blocks`: The `conv -> [norm] -> ReLU` unit.
//! - `encoder`: Encoder stages and the skip handles they emit.
//! - `bottleneck`: The shared branch point below the deepest stage.
//! - `decoder`: Decoder stages and the per-field decoder heads.
//! - `unet`: The complete model assembled from a [`crate::ModelConfig`].

pub mod blocks;
pub mod bottleneck;
pub mod decoder;
pub mod encoder;
pub mod unet;

pub use encoder::SkipHandle;
pub use unet::{CfdFields, DeepCfdConfig, DeepCfdNet, DeepCfdNetRecord};
