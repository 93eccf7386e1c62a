use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use peak_field_core::config::{FieldConfig, PeakConfig, PeakLayerConfig};
use peak_field_core::world::PeakField;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

const WORLD_DIM: usize = 100;
const WARMUP_STEPS: usize = 10;
const BENCHMARK_STEPS: usize = 200;

#[derive(Parser)]
#[command(name = "peak-field")]
#[command(about = "Moving resource peak field CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single field simulation from a config file
    Run {
        /// Path to config file (JSON)
        #[arg(long)]
        config: PathBuf,

        /// Output directory for results (optional)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Number of simulation steps to run (default: 10000)
        #[arg(long, default_value_t = 10000)]
        steps: usize,

        /// Step interval between metric samples (default: 100)
        #[arg(long, default_value_t = 100)]
        sample_every: usize,
    },
    /// Run the performance benchmark suite
    Benchmark,
    /// Dump the default configuration to stdout
    DumpDefaultConfig,
}

fn benchmark_config(layers: usize, seed: u64) -> FieldConfig {
    let peak = PeakConfig {
        height: 6.0,
        spread: 15.0,
        plateau: 3.0,
        max_x: WORLD_DIM as i64 - 1,
        max_y: WORLD_DIM as i64 - 1,
        ..PeakConfig::default()
    };
    FieldConfig {
        seed,
        world_x: WORLD_DIM,
        world_y: WORLD_DIM,
        bite_every: 3,
        bite_amount: 0.5,
        layers: (0..layers)
            .map(|i| PeakLayerConfig {
                start: [
                    10.0 + (i * 7 % 80) as f64,
                    10.0 + (i * 13 % 80) as f64,
                ],
                peak: peak.clone(),
            })
            .collect(),
        ..FieldConfig::default()
    }
}

fn run_benchmark(layers: usize, seed: u64) -> Result<()> {
    let config = benchmark_config(layers, seed);
    config
        .validate()
        .context("Benchmark config validation error")?;
    let mut field = PeakField::try_new(config).context("Failed to initialize field")?;

    // Warmup
    for _ in 0..WARMUP_STEPS {
        field.step();
    }

    // Benchmark
    let mut total_graze = 0u64;
    let mut total_advance = 0u64;
    let mut total_time = 0u64;

    for _ in 0..BENCHMARK_STEPS {
        let timings = field.step();
        total_graze += timings.graze_us;
        total_advance += timings.advance_us;
        total_time += timings.total_us;
    }

    let avg_step_us = total_time as f64 / BENCHMARK_STEPS as f64;
    let steps_per_sec = 1_000_000.0 / avg_step_us.max(1.0);

    println!("--- {layers} layers on {WORLD_DIM}x{WORLD_DIM} grid ---");
    println!("  Avg step:      {avg_step_us:.0} us ({steps_per_sec:.1} steps/sec)");
    println!(
        "  Breakdown:     graze={:.0} us, advance={:.0} us",
        total_graze as f64 / BENCHMARK_STEPS as f64,
        total_advance as f64 / BENCHMARK_STEPS as f64,
    );
    println!("  Refreshes:     {}", field.total_refreshes());
    println!();
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::DumpDefaultConfig => {
            let config = FieldConfig::default();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Benchmark => {
            if cfg!(debug_assertions) {
                eprintln!("WARNING: running in debug mode. Results are not representative.");
                eprintln!("         Use: cargo run -p peak-field-cli --release -- benchmark");
                eprintln!();
            }
            println!("=== Peak Field Benchmark ===");
            println!("Warmup: {WARMUP_STEPS} steps, Benchmark: {BENCHMARK_STEPS} steps");
            println!();

            for layers in [1, 4, 16, 64] {
                run_benchmark(layers, 42)?;
            }
        }
        Commands::Run {
            config,
            out,
            steps,
            sample_every,
        } => {
            let file = File::open(&config).context("failed to open config file")?;
            let reader = BufReader::new(file);
            let field_config: FieldConfig =
                serde_json::from_reader(reader).context("failed to parse config")?;

            field_config.validate().context("Config validation error")?;

            info!("Loaded config from {:?}", config);
            info!(
                "Simulating {} layers for {} steps...",
                field_config.layers.len(),
                steps
            );

            let mut field =
                PeakField::try_new(field_config).context("Failed to initialize field")?;
            let summary = field
                .try_run_experiment(steps, sample_every)
                .context("Experiment rejected")?;

            if let Some(out_dir) = out {
                std::fs::create_dir_all(&out_dir).context("failed to create output directory")?;
                let summary_path = out_dir.join("summary.json");
                let file = File::create(summary_path).context("failed to create summary file")?;
                serde_json::to_writer_pretty(file, &summary).context("failed to write summary")?;
                info!("Run complete. Results saved to {:?}", out_dir);
            } else {
                info!(
                    "Run complete. Refreshes: {}, bites: {}",
                    summary.total_refreshes, summary.total_bites
                );
            }
        }
    }
    Ok(())
}
