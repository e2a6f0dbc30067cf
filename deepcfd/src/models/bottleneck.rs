use burn::prelude::*;

use super::blocks::{ConvBlock, ConvBlockConfig};

/// Configuration for the `Bottleneck` module.
#[derive(Config, Debug)]
pub struct BottleneckBlockConfig {
    in_channels: usize,
    channels: usize,
    #[config(default = "1")]
    depth: usize,
    #[config(default = "3")]
    kernel_size: usize,
    #[config(default = "true")]
    normalize: bool,
}

impl BottleneckBlockConfig {
    /// Initializes a new `Bottleneck` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> Bottleneck<B> {
        let blocks = (0..self.depth)
            .map(|i| {
                let in_channels = if i == 0 { self.in_channels } else { self.channels };
                ConvBlockConfig::new(in_channels, self.channels)
                    .with_kernel_size(self.kernel_size)
                    .with_normalize(self.normalize)
                    .init(device)
            })
            .collect();

        Bottleneck { blocks }
    }
}

/// The shared branch point between the encoder and every decoder head.
#[derive(Module, Debug)]
pub struct Bottleneck<B: Backend> {
    blocks: Vec<ConvBlock<B>>,
}

impl<B: Backend> Bottleneck<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.blocks.iter().fold(x, |x, block| block.forward(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_bottleneck_keeps_resolution() {
        let device = Default::default();
        for depth in [1, 2] {
            let bottleneck = BottleneckBlockConfig::new(32, 64)
                .with_depth(depth)
                .init::<TestBackend>(&device);
            let x = Tensor::<TestBackend, 4>::ones([1, 32, 5, 3], &device);

            assert_eq!(bottleneck.forward(x).dims(), [1, 64, 5, 3]);
            assert_eq!(bottleneck.blocks.len(), depth);
        }
    }
}
