//! Configuration module for DeepCFD.
//!
//! This module provides configuration structures and enums for the DeepCFD models.
//! It is organized into two main submodules:
//! - `core`: Contains the main configuration structures
//! - `enums`: Contains the policy enums and input padding types

pub mod core;
pub mod enums;

pub use core::{BottleneckConfig, DecoderConfig, EncoderConfig, InputConfig, ModelConfig};

pub use enums::{ConstantPadding, DecoderOrder, InputPadding, PoolPolicy, Upsample};
