pub mod callbacks;
pub mod trainer;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::model::checkpoint::TrainingSummary;

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of training epochs
    pub epochs: usize,
    /// Batch size
    pub batch_size: usize,
    /// Adam learning rate
    pub learning_rate: f64,
    /// Random seed for initialisation and shuffling
    pub seed: u64,
    /// Number of workers for data loading
    pub num_workers: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 50,
            batch_size: 32,
            learning_rate: 0.001,
            seed: 2026,
            num_workers: 1,
        }
    }
}

impl TrainingConfig {
    /// Create configuration for quick testing
    pub fn quick_test() -> Self {
        Self {
            epochs: 3,
            batch_size: 8,
            learning_rate: 0.01,
            ..Default::default()
        }
    }

    /// Read a JSON config file; absent fields keep their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read training config {:?}", path))?;
        serde_json::from_str(&json).with_context(|| format!("Failed to parse training config {:?}", path))
    }
}

/// Metrics for one pass over a dataset
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct EpochMetrics {
    /// Mean batch loss
    pub loss: f64,
    /// Fraction of rows whose top class matches the target
    pub accuracy: f64,
}

/// Training state
#[derive(Debug, Clone, Default)]
pub struct TrainingState {
    /// Epochs completed
    pub epoch: usize,
    /// Optimizer steps taken
    pub global_step: usize,
    /// Training loss history
    pub train_loss_history: Vec<f64>,
    /// Validation metric history
    pub val_history: Vec<EpochMetrics>,
}

impl TrainingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update after epoch
    pub fn update_epoch(&mut self, train_loss: f64, val: EpochMetrics) {
        self.epoch += 1;
        self.train_loss_history.push(train_loss);
        self.val_history.push(val);
    }

    /// Best validation accuracy seen so far
    pub fn best_accuracy(&self) -> f64 {
        self.val_history
            .iter()
            .map(|m| m.accuracy)
            .fold(0.0, f64::max)
    }
}

/// Training result
#[derive(Debug, Clone)]
pub struct TrainingResult {
    /// Final training state
    pub state: TrainingState,
    /// Metrics on the test set after the last epoch
    pub final_metrics: EpochMetrics,
    /// Summary persisted next to the model
    pub summary: TrainingSummary,
    /// Training duration in seconds
    pub duration_secs: f64,
}
