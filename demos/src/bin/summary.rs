//! DeepCFD Architecture Summary
//!
//! Plans a model without allocating any parameters and prints every stage's
//! resolution and channel count.
//!
//! ## Usage
//!
//! ```bash
//! # Table for the default three-head U-Net
//! cargo run --bin summary
//!
//! # JSON plan of a custom configuration
//! cargo run --bin summary -- --widths 8,16,32,64 --upsample transpose --json
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use deepcfd_burn::ModelSpec;
use deepcfd_demos::{init_tracing, ArchitectureArgs};

#[derive(Parser, Debug)]
#[command(author, version, about = "Print the shape plan of a DeepCFD model", long_about = None)]
struct Args {
    #[command(flatten)]
    arch: ArchitectureArgs,

    /// Print the plan as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Write the resolved model configuration to this path
    #[arg(long)]
    save_config: Option<std::path::PathBuf>,
}

fn print_table(spec: &ModelSpec) {
    println!("Model: {}", spec.name);
    println!("Input: {}", spec.input);
    println!("Heads: {}", spec.head_names().collect::<Vec<_>>().join(", "));
    if spec.padded != spec.input.resolution() {
        println!("Padded input: {}", spec.padded);
    }
    println!();
    println!(
        "{:<14} {:>10} {:>10} {:>10} {:>12}",
        "stage", "in", "out", "skip", "resolution"
    );
    for stage in &spec.encoder {
        println!(
            "{:<14} {:>10} {:>10} {:>10} {:>12}",
            format!("encoder {}", stage.index),
            stage.in_channels,
            stage.out_channels,
            stage.skip.to_string(),
            stage.pooled.to_string(),
        );
    }
    println!(
        "{:<14} {:>10} {:>10} {:>10} {:>12}",
        "bottleneck",
        spec.bottleneck.in_channels,
        spec.bottleneck.channels,
        "-",
        spec.bottleneck.resolution.to_string(),
    );
    for stage in &spec.decoder {
        println!(
            "{:<14} {:>10} {:>10} {:>10} {:>12}",
            format!("decoder {}", stage.index),
            stage.fused_channels,
            stage.out_channels,
            stage.skip_channels,
            stage.fused.to_string(),
        );
    }
    println!();
    for output in &spec.outputs {
        println!("Output: {output}");
    }
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = args.arch.to_config()?;
    let spec = config.plan().context("failed to plan model")?;
    tracing::info!(name = %spec.name, heads = spec.outputs.len(), "planned model");

    if let Some(path) = &args.save_config {
        std::fs::write(path, serde_json::to_string_pretty(&config)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "saved model config");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&spec)?);
    } else {
        print_table(&spec);
    }

    Ok(())
}
