//! Compile-time backend for the forward-pass benchmark.
//!
//! `cuda` takes precedence over `wgpu`; without either feature the CPU
//! `ndarray` backend is used.

use burn::prelude::Device;
use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(feature = "cuda")] {
        pub type BenchBackend = burn::backend::Cuda;
        pub const BACKEND_NAME: &str = "cuda";
    } else if #[cfg(feature = "wgpu")] {
        pub type BenchBackend = burn::backend::Wgpu;
        pub const BACKEND_NAME: &str = "wgpu";
    } else {
        pub type BenchBackend = burn::backend::NdArray;
        pub const BACKEND_NAME: &str = "ndarray";
    }
}

/// Default device of [`BenchBackend`].
pub fn bench_device() -> Device<BenchBackend> {
    Default::default()
}
