//! Identity module implementation

use burn::prelude::*;

/// A parameterless module that returns its input unchanged.
///
/// Used where a block slot is optional, e.g. the normalization slot of a
/// convolution block built without batch normalization.
#[derive(Module, Clone, Debug, Default)]
pub struct Identity;

impl Identity {
    pub const fn new() -> Self {
        Self
    }

    pub const fn forward<B: Backend, const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        input
    }
}
