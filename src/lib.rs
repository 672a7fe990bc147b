//! # Cura: disease prediction from symptoms
//!
//! Cura trains a small feed-forward classifier on a binary symptom table and
//! serves ranked disease predictions, each paired with a suggested
//! specialist.
//!
//! ## Features
//!
//! - Training from CSV/TSV symptom tables (optionally gzipped)
//! - Top-3 disease ranking with confidence percentages
//! - Keyword-based disease to specialist mapping
//! - HTTP API with a chat endpoint and demo login
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cura::data::DataLoader;
//! use cura::model::checkpoint::ModelSaver;
//! use cura::predict::Predictor;
//! use cura::training::{trainer::Trainer, TrainingConfig};
//! use cura::{DefaultBackend, TrainingBackend};
//!
//! // Load and train
//! let tables = DataLoader::new().load_split("Training.csv", "Testing.csv").unwrap();
//! let mut trainer = Trainer::<TrainingBackend>::new(TrainingConfig::default(), Default::default());
//! let trained = trainer.train(&tables).unwrap();
//! ModelSaver::new("artifacts")
//!     .save(&trained.model, &trained.metadata, &trained.encoder)
//!     .unwrap();
//!
//! // Predict
//! let predictor =
//!     Predictor::from_artifacts::<DefaultBackend>("artifacts".as_ref(), None, Default::default()).unwrap();
//! let results = predictor.predict("itching, skin rash").unwrap();
//! ```

pub mod api;
pub mod cli;
pub mod data;
pub mod doctor;
pub mod model;
pub mod predict;
pub mod training;
pub mod utils;

use burn::backend::{Autodiff, NdArray};

/// Default backend type for inference
pub type DefaultBackend = NdArray<f32>;

/// Backend used for training
pub type TrainingBackend = Autodiff<NdArray<f32>>;

/// Re-export commonly used types
pub use data::{DataLoader, LabelEncoder, SymptomSchema};
pub use doctor::DoctorMapping;
pub use model::{architecture::DiseaseClassifier, ModelConfig};
pub use predict::{ChatResponse, DiseasePrediction, Predictor};
pub use training::{TrainingConfig, TrainingResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!(
        "{} v{} - disease prediction from symptoms",
        NAME, VERSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_info() {
        let info_str = info();
        assert!(info_str.contains("cura"));
        assert!(info_str.contains(VERSION));
    }
}
