//! DeepCFD Demos
//!
//! Command-line tools around the `deepcfd-burn` architecture builder.
//!
//! ## Available Demos
//!
//! - `summary`: Prints the shape plan of a model as a table or as JSON
//! - `bench`: Builds a model on the selected backend and times forward passes
//!
//! ## Usage
//!
//! ```bash
//! # Shape plan of the three-head U-Net for 172x79 inputs, padded to the stage multiple
//! cargo run --bin summary -- --height 172 --width 79 --channels 3 --pad-value 0
//!
//! # Same plan as JSON, from a saved configuration
//! cargo run --bin summary -- --config model.json --json
//!
//! # Benchmark the autoencoder variant on the GPU
//! cargo run --release --no-default-features --features wgpu --bin bench -- --no-skip
//! ```

pub mod backend;
pub mod cli;

pub use backend::{bench_device, BenchBackend, BACKEND_NAME};
pub use cli::{init_tracing, ArchitectureArgs};
