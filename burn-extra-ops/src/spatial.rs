//! # Spatial Cropping and Padding
//!
//! Helpers operating on the two spatial axes of `[batch, channels, height, width]`
//! tensors: windowed crops, constant padding and edge replication.

use core::ops::Range;

use burn::prelude::*;

/// A rectangular window over the spatial axes of a feature map.
///
/// The window is clamped to the tensor it is applied to, so an oversized
/// window crops nothing instead of slicing out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpatialWindow {
    pub top: usize,
    pub left: usize,
    pub height: usize,
    pub width: usize,
}

impl SpatialWindow {
    /// Creates a window of `height` x `width` whose top-left corner is at `(top, left)`.
    pub const fn new(top: usize, left: usize, height: usize, width: usize) -> Self {
        Self {
            top,
            left,
            height,
            width,
        }
    }

    /// A window anchored at the top-left corner.
    pub const fn anchored(height: usize, width: usize) -> Self {
        Self::new(0, 0, height, width)
    }

    /// Row and column ranges of the window inside a `height` x `width` map.
    pub fn to_ranges(&self, height: usize, width: usize) -> (Range<usize>, Range<usize>) {
        let clamp = |start: usize, len: usize, bound: usize| {
            let start = start.min(bound);
            start..(start + len).min(bound)
        };
        (
            clamp(self.top, self.height, height),
            clamp(self.left, self.width, width),
        )
    }
}

/// Crops a feature map to `window`.
pub fn crop<B: Backend>(x: Tensor<B, 4>, window: SpatialWindow) -> Tensor<B, 4> {
    let [b, c, h, w] = x.dims();
    let (rows, cols) = window.to_ranges(h, w);
    if rows == (0..h) && cols == (0..w) {
        return x;
    }
    x.slice([0..b, 0..c, rows, cols])
}

/// Crops two feature maps to their common top-left-anchored resolution.
pub fn crop_to_match<B: Backend>(a: Tensor<B, 4>, b: Tensor<B, 4>) -> (Tensor<B, 4>, Tensor<B, 4>) {
    let [_, _, ha, wa] = a.dims();
    let [_, _, hb, wb] = b.dims();
    let window = SpatialWindow::anchored(ha.min(hb), wa.min(wb));
    (crop(a, window), crop(b, window))
}

/// Pads the spatial axes with a constant.
///
/// `amounts` is `[top, bottom, left, right]`.
pub fn pad_constant<B: Backend>(x: Tensor<B, 4>, amounts: [usize; 4], value: f32) -> Tensor<B, 4> {
    let [top, bottom, left, right] = amounts;
    if amounts.iter().all(|&a| a == 0) {
        return x;
    }
    x.pad((left, right, top, bottom), value)
}

/// Replicates the last row and/or column so both spatial axes are even.
///
/// A 2x2 max pool over the result rounds odd resolutions up without the
/// replicated border changing any maximum.
pub fn pad_edge_to_even<B: Backend>(x: Tensor<B, 4>) -> Tensor<B, 4> {
    let [b, c, h, w] = x.dims();
    let x = if h % 2 == 1 {
        let last_row = x.clone().slice([0..b, 0..c, h - 1..h, 0..w]);
        Tensor::cat(vec![x, last_row], 2)
    } else {
        x
    };

    let h = x.dims()[2];
    if w % 2 == 1 {
        let last_col = x.clone().slice([0..b, 0..c, 0..h, w - 1..w]);
        Tensor::cat(vec![x, last_col], 3)
    } else {
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{backend::NdArray, tensor::TensorData};

    type TestBackend = NdArray<f32>;

    fn grid(h: usize, w: usize) -> Tensor<TestBackend, 4> {
        Tensor::<TestBackend, 1, Int>::arange(0..(h * w) as i64, &Default::default())
            .float()
            .reshape([1, 1, h, w])
    }

    #[test]
    fn test_window_is_clamped() {
        let window = SpatialWindow::new(2, 1, 10, 3);
        assert_eq!(window.to_ranges(5, 8), (2..5, 1..4));
        assert_eq!(SpatialWindow::new(9, 0, 2, 2).to_ranges(5, 5), (5..5, 0..2));
    }

    #[test]
    fn test_crop_window() {
        let out = crop(grid(4, 5), SpatialWindow::new(1, 2, 2, 2));
        assert_eq!(out.dims(), [1, 1, 2, 2]);
        out.into_data()
            .assert_eq(&TensorData::from([[[[7.0f32, 8.0], [12.0, 13.0]]]]), false);
    }

    #[test]
    fn test_crop_to_match_anchors_top_left() {
        let (a, b) = crop_to_match(grid(5, 4), grid(4, 6));
        assert_eq!(a.dims(), [1, 1, 4, 4]);
        assert_eq!(b.dims(), [1, 1, 4, 4]);
        a.slice([0..1, 0..1, 0..1, 0..4])
            .into_data()
            .assert_eq(&TensorData::from([[[[0.0f32, 1.0, 2.0, 3.0]]]]), false);
    }

    #[test]
    fn test_pad_constant_asymmetric() {
        let out = pad_constant(grid(2, 2), [1, 0, 0, 2], -1.0);
        assert_eq!(out.dims(), [1, 1, 3, 4]);
        out.into_data().assert_eq(
            &TensorData::from([[[
                [-1.0f32, -1.0, -1.0, -1.0],
                [0.0, 1.0, -1.0, -1.0],
                [2.0, 3.0, -1.0, -1.0],
            ]]]),
            false,
        );
    }

    #[test]
    fn test_pad_edge_to_even() {
        let out = pad_edge_to_even(grid(3, 3));
        assert_eq!(out.dims(), [1, 1, 4, 4]);
        out.into_data().assert_eq(
            &TensorData::from([[[
                [0.0f32, 1.0, 2.0, 2.0],
                [3.0, 4.0, 5.0, 5.0],
                [6.0, 7.0, 8.0, 8.0],
                [6.0, 7.0, 8.0, 8.0],
            ]]]),
            false,
        );

        assert_eq!(pad_edge_to_even(grid(4, 6)).dims(), [1, 1, 4, 6]);
    }
}
