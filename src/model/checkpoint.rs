use anyhow::{Context, Result};
use burn::prelude::*;
use burn::record::CompactRecorder;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::data::{LabelEncoder, SymptomSchema};
use crate::model::architecture::DiseaseClassifier;
use crate::model::ModelConfig;

/// Weights file stem; the recorder appends `.mpk`
pub const MODEL_FILE_STEM: &str = "disease_model";

/// Model metadata file name
pub const METADATA_FILE: &str = "disease_model.json";

/// Label encoder file name
pub const ENCODER_FILE: &str = "label_encoder.json";

/// Default doctor mapping file name
pub const MAPPING_FILE: &str = "disease_doctor_mapping.csv";

/// Summary of the training run that produced a model
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrainingSummary {
    /// Number of epochs run
    pub epochs: usize,
    /// Batch size
    pub batch_size: usize,
    /// Learning rate
    pub learning_rate: f64,
    /// Number of training rows
    pub train_samples: usize,
    /// Number of test rows
    pub test_samples: usize,
    /// Loss on the test set after training
    pub test_loss: f64,
    /// Accuracy on the test set after training
    pub test_accuracy: f64,
}

/// Everything needed besides the weights to rebuild and use a model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Crate version that wrote the model
    pub version: String,
    /// Architecture
    pub model_config: ModelConfig,
    /// Input-vector column order
    pub symptoms: SymptomSchema,
    /// Training run
    pub training: TrainingSummary,
    /// Timestamp
    pub timestamp: String,
}

impl ModelMetadata {
    pub fn new(model_config: ModelConfig, symptoms: SymptomSchema, training: TrainingSummary) -> Self {
        Self {
            version: crate::VERSION.to_string(),
            model_config,
            symptoms,
            training,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Reads and writes the artifacts directory:
/// weights, metadata and label encoder.
pub struct ModelSaver {
    dir: PathBuf,
}

impl ModelSaver {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn weights_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE_STEM)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }

    pub fn encoder_path(&self) -> PathBuf {
        self.dir.join(ENCODER_FILE)
    }

    pub fn mapping_path(&self) -> PathBuf {
        self.dir.join(MAPPING_FILE)
    }

    /// Save model, metadata and encoder
    pub fn save<B: Backend>(
        &self,
        model: &DiseaseClassifier<B>,
        metadata: &ModelMetadata,
        encoder: &LabelEncoder,
    ) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create artifacts directory {:?}", self.dir))?;

        model
            .clone()
            .save_file(self.weights_path(), &CompactRecorder::new())
            .with_context(|| format!("Failed to save model to {:?}", self.weights_path()))?;

        let metadata_json =
            serde_json::to_string_pretty(metadata).context("Failed to serialize metadata")?;
        fs::write(self.metadata_path(), metadata_json).context("Failed to write metadata file")?;

        encoder.save(self.encoder_path())?;

        info!("Saved model for inference in {:?}", self.dir);
        Ok(())
    }

    /// Load metadata only
    pub fn load_metadata(&self) -> Result<ModelMetadata> {
        let metadata_json = fs::read_to_string(self.metadata_path())
            .with_context(|| format!("Failed to read metadata file {:?}", self.metadata_path()))?;
        serde_json::from_str(&metadata_json).context("Failed to parse metadata")
    }

    /// Load the label encoder only
    pub fn load_encoder(&self) -> Result<LabelEncoder> {
        LabelEncoder::load(self.encoder_path())
    }

    /// Load model, metadata and encoder
    pub fn load<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<(DiseaseClassifier<B>, ModelMetadata, LabelEncoder)> {
        info!("Loading model from {:?}", self.dir);

        let metadata = self.load_metadata()?;
        let encoder = self.load_encoder()?;

        if encoder.num_classes() != metadata.model_config.num_classes {
            anyhow::bail!(
                "Label encoder has {} classes but the model was built for {}",
                encoder.num_classes(),
                metadata.model_config.num_classes
            );
        }
        if metadata.symptoms.len() != metadata.model_config.input_size {
            anyhow::bail!(
                "Symptom schema has {} entries but the model expects {} inputs",
                metadata.symptoms.len(),
                metadata.model_config.input_size
            );
        }

        let model = metadata
            .model_config
            .init::<B>(device)
            .load_file(self.weights_path(), &CompactRecorder::new(), device)
            .with_context(|| {
                format!(
                    "Cannot load weights from {:?}. Has the model been trained?",
                    self.weights_path()
                )
            })?;

        info!(
            "Loaded model: {} symptoms, {} diseases, trained {}",
            metadata.symptoms.len(),
            encoder.num_classes(),
            metadata.timestamp
        );
        Ok((model, metadata, encoder))
    }
}
