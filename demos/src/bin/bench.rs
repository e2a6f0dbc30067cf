//! DeepCFD Forward-Pass Benchmark
//!
//! Builds a model on the backend selected at compile time and times repeated
//! forward passes over random inputs.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin bench -- --batch-size 8 --iterations 20
//! ```

use std::time::Instant;

use anyhow::{Context, Result};
use burn::tensor::{Distribution, Tensor};
use clap::Parser;
use deepcfd_burn::DeepCfdConfig;
use deepcfd_demos::{bench_device, init_tracing, ArchitectureArgs, BenchBackend, BACKEND_NAME};

#[derive(Parser, Debug)]
#[command(author, version, about = "Time DeepCFD forward passes", long_about = None)]
struct Args {
    #[command(flatten)]
    arch: ArchitectureArgs,

    /// Samples per forward pass
    #[arg(short, long, default_value_t = 4)]
    batch_size: usize,

    /// Timed iterations
    #[arg(short, long, default_value_t = 10)]
    iterations: usize,

    /// Untimed iterations run first
    #[arg(long, default_value_t = 2)]
    warmup: usize,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let device = bench_device();
    tracing::info!(backend = BACKEND_NAME, ?device, "using backend");

    let config = args.arch.to_config()?;
    let model = DeepCfdConfig::new(config)
        .init::<BenchBackend>(&device)
        .context("failed to build model")?;
    let input_spec = model.input_spec().clone();
    tracing::info!(
        input = %input_spec,
        heads = model.num_heads(),
        "model initialized"
    );

    let x = Tensor::<BenchBackend, 4>::random(
        input_spec.dims(args.batch_size),
        Distribution::Normal(0.0, 1.0),
        &device,
    );
    model.check_input(&x)?;

    for _ in 0..args.warmup {
        let fields = model.forward(x.clone());
        // Force execution on lazy backends.
        let _ = fields.stacked().into_data();
    }

    let start = Instant::now();
    for _ in 0..args.iterations {
        let fields = model.forward(x.clone());
        let _ = fields.stacked().into_data();
    }
    let elapsed = start.elapsed();

    let per_iteration = elapsed / args.iterations.max(1) as u32;
    tracing::info!(
        iterations = args.iterations,
        batch = args.batch_size,
        ?elapsed,
        ?per_iteration,
        "benchmark finished"
    );
    println!(
        "{} on {}: {} iterations of batch {} in {:.2?} ({:.2?} per iteration)",
        model.spec().name,
        BACKEND_NAME,
        args.iterations,
        args.batch_size,
        elapsed,
        per_iteration
    );

    Ok(())
}
