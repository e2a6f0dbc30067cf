//! Additional operations for the Burn deep learning framework
//!
//! This crate provides operations that encoder-decoder networks need but that
//! are not available as modules in the core Burn framework.

use burn::prelude::*;

mod identity;
mod spatial;

// Convenient re-exports
pub use identity::Identity;
pub use spatial::{crop, crop_to_match, pad_constant, pad_edge_to_even, SpatialWindow};

/// Spatial operations available directly on 4D Burn tensors
pub trait TensorSpatialOps<B: Backend> {
    /// Crop the spatial axes to `window`
    fn crop_spatial(self, window: SpatialWindow) -> Self;

    /// Pad the spatial axes with a constant; `amounts` is `[top, bottom, left, right]`
    fn pad_spatial(self, amounts: [usize; 4], value: f32) -> Self;
}

impl<B: Backend> TensorSpatialOps<B> for Tensor<B, 4> {
    fn crop_spatial(self, window: SpatialWindow) -> Self {
        crop(self, window)
    }

    fn pad_spatial(self, amounts: [usize; 4], value: f32) -> Self {
        pad_constant(self, amounts, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_pad_then_crop_restores_shape() {
        let device = Default::default();
        let tensor = Tensor::<TestBackend, 4>::random(
            [2, 3, 7, 5],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );

        let padded = tensor.clone().pad_spatial([1, 0, 2, 3], 0.0);
        assert_eq!(padded.dims(), [2, 3, 8, 10]);

        let restored = padded.crop_spatial(SpatialWindow::new(1, 2, 7, 5));
        restored
            .into_data()
            .assert_eq(&tensor.into_data(), true);
    }
}
