use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::api::types::DEFAULT_ADDR;
use crate::training::TrainingConfig;

/// Cura: disease prediction from symptoms with specialist suggestions
#[derive(Parser, Debug)]
#[command(name = "cura")]
#[command(about = "Disease prediction from symptoms with specialist suggestions")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a model from training and testing CSVs
    Train(TrainArgs),

    /// Predict diseases for comma-separated symptom lists
    Predict(PredictArgs),

    /// Write the heuristic disease to specialist mapping
    Mapping(MappingArgs),

    /// Serve the HTTP API
    Serve(ServeArgs),
}

/// Training arguments
#[derive(Parser, Debug)]
pub struct TrainArgs {
    /// Training data file (CSV or TSV, optionally gzipped)
    #[arg(long, required = true)]
    pub train: PathBuf,

    /// Testing data file, same format as the training file
    #[arg(long, required = true)]
    pub test: PathBuf,

    /// Artifacts directory for the model, metadata and label encoder
    #[arg(short, long, default_value = "./artifacts")]
    pub output: PathBuf,

    /// Training configuration file (JSON); flags below override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of training epochs [default: 50]
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Batch size [default: 32]
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Learning rate [default: 0.001]
    #[arg(long)]
    pub learning_rate: Option<f64>,

    /// Random seed [default: 2026]
    #[arg(long)]
    pub seed: Option<u64>,

    /// Quick test mode (few epochs, small batches); cannot be combined with --config
    #[arg(long, conflicts_with = "config")]
    pub quick: bool,
}

impl TrainArgs {
    /// Defaults (or the config file, or quick mode), then explicit flags
    pub fn training_config(&self) -> Result<TrainingConfig> {
        let mut config = match &self.config {
            Some(path) => TrainingConfig::load(path)?,
            None if self.quick => TrainingConfig::quick_test(),
            None => TrainingConfig::default(),
        };

        if let Some(epochs) = self.epochs {
            config.epochs = epochs;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(learning_rate) = self.learning_rate {
            config.learning_rate = learning_rate;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        Ok(config)
    }
}

/// Prediction arguments
#[derive(Parser, Debug)]
pub struct PredictArgs {
    /// Artifacts directory written by `train`
    #[arg(short, long, default_value = "./artifacts")]
    pub artifacts: PathBuf,

    /// Doctor mapping CSV (disease,specialist without header)
    #[arg(short, long)]
    pub mapping: Option<PathBuf>,

    /// Print the JSON reply the HTTP API would send
    #[arg(long)]
    pub json: bool,

    /// One or more entries, each a comma-separated symptom list
    #[arg(required = true)]
    pub symptoms: Vec<String>,
}

/// Mapping arguments
#[derive(Parser, Debug)]
pub struct MappingArgs {
    /// Artifacts directory written by `train`
    #[arg(short, long, default_value = "./artifacts")]
    pub artifacts: PathBuf,

    /// Output CSV [default: <artifacts>/disease_doctor_mapping.csv]
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Server arguments
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Artifacts directory written by `train`
    #[arg(short, long, default_value = "./artifacts")]
    pub artifacts: PathBuf,

    /// Doctor mapping CSV (disease,specialist without header)
    #[arg(short, long)]
    pub mapping: Option<PathBuf>,

    /// Listen address
    #[arg(long, default_value = DEFAULT_ADDR)]
    pub addr: SocketAddr,
}

/// Parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Setup logging based on verbosity. `RUST_LOG` wins when set.
pub fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
