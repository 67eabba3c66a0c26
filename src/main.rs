use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use sensor_insights::constants::{DEFAULT_ROWS_PER_SENSOR, DEFAULT_SEED, METRICS_FILE};
use sensor_insights::pipeline::ingestion::sample::write_sample;
use sensor_insights::pipeline::report::print_console_summary;
use sensor_insights::{logging, metrics, Config, Pipeline};

#[derive(Parser)]
#[command(name = "sensor_insights")]
#[command(about = "IoT sensor transmission analysis: efficiency, anomalies and charts")]
#[command(version = "0.1.0")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis and write charts and reports
    Analyze {
        /// Input CSV with one row per transmission
        #[arg(long)]
        input: PathBuf,
        /// Where artifacts are written (overrides output.directory)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Expected share of anomalies, in (0, 0.5]
        #[arg(long)]
        contamination: Option<f64>,
        /// Seed for the anomaly detector
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Write a synthetic input file for the known sensor types
    GenerateSample {
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = DEFAULT_ROWS_PER_SENSOR)]
        rows_per_sensor: usize,
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
    /// Load and derive only, then report row and exclusion counts
    Validate {
        #[arg(long)]
        input: PathBuf,
    },
}

fn load_config(path: Option<&Path>, contamination: Option<f64>, seed: Option<u64>) -> anyhow::Result<Config> {
    let mut config = Config::load(path).context("failed to load configuration")?;
    if let Some(c) = contamination {
        config.detector.contamination = c;
    }
    if let Some(s) = seed {
        config.detector.seed = s;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let (contamination, seed) = match &cli.command {
        Commands::Analyze {
            contamination, seed, ..
        } => (*contamination, *seed),
        _ => (None, None),
    };
    let config_path = Config::resolve_path(cli.config.as_deref());
    let config = load_config(config_path.as_deref(), contamination, seed)?;
    let _log_guard = logging::init_logging(&config.logging);
    match &config_path {
        Some(path) => info!(path = %path.display(), "Loaded configuration"),
        None => info!("Using built-in configuration defaults"),
    }

    match cli.command {
        Commands::Analyze { input, output_dir, .. } => {
            metrics::init_metrics();
            let output_dir = output_dir.unwrap_or_else(|| config.output.directory.clone());
            let pipeline = Pipeline::new(config);

            let result = match pipeline.run(&input, &output_dir) {
                Ok(result) => result,
                Err(e) => {
                    error!("Analysis failed: {}", e);
                    println!("❌ Analysis failed: {}", e);
                    return Err(e).with_context(|| format!("analysis of '{}' failed", input.display()));
                }
            };
            print_console_summary(&result.summary);

            let metrics_path = result.artifact(METRICS_FILE);
            match metrics::write_snapshot(&metrics_path) {
                Ok(true) => info!(path = %metrics_path.display(), "Wrote metrics snapshot"),
                Ok(false) => {}
                Err(e) => warn!("Failed to write metrics snapshot: {}", e),
            }
            println!("\n✅ Artifacts written to {}", result.output_dir.display());
        }
        Commands::GenerateSample {
            output,
            rows_per_sensor,
            seed,
        } => {
            let written = write_sample(&output, rows_per_sensor, seed)
                .with_context(|| format!("failed to write sample to '{}'", output.display()))?;
            println!("✅ Wrote {} readings to {}", written, output.display());
        }
        Commands::Validate { input } => {
            let pipeline = Pipeline::new(config);
            let report = pipeline
                .validate(&input)
                .with_context(|| format!("'{}' is not usable", input.display()))?;
            println!("\n📋 Validation of {}", input.display());
            println!("   Rows loaded: {}", report.rows_loaded);
            println!("   Rows usable: {}", report.rows_usable);
            for (reason, count) in &report.exclusions {
                println!("   Excluded ({reason}): {count}");
            }
        }
    }
    Ok(())
}
