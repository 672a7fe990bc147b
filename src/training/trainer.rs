use crate::data::batcher::{SymptomBatch, SymptomBatcher, SymptomDataset};
use crate::data::{LabelEncoder, SplitTables};
use crate::model::architecture::DiseaseClassifier;
use crate::model::checkpoint::{ModelMetadata, TrainingSummary};
use crate::model::ModelConfig;
use crate::training::callbacks::{CallbackManager, TrainingCallback};
use crate::training::{EpochMetrics, TrainingConfig, TrainingResult, TrainingState};
use anyhow::{bail, Context, Result};
use burn::data::dataloader::{DataLoader, DataLoaderBuilder};
use burn::data::dataset::Dataset;
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// A trained classifier together with what is persisted beside it
pub struct TrainedModel<B: Backend> {
    pub model: DiseaseClassifier<B>,
    pub encoder: LabelEncoder,
    pub metadata: ModelMetadata,
    pub result: TrainingResult,
}

/// Supervised trainer for the disease classifier
pub struct Trainer<B: AutodiffBackend> {
    /// Training configuration
    config: TrainingConfig,
    /// Device
    device: B::Device,
    /// Epoch and batch observers
    callbacks: CallbackManager,
}

impl<B: AutodiffBackend> Trainer<B> {
    pub fn new(config: TrainingConfig, device: B::Device) -> Self {
        Self {
            config,
            device,
            callbacks: CallbackManager::new(),
        }
    }

    pub fn with_callback<C: TrainingCallback + 'static>(mut self, callback: C) -> Self {
        self.callbacks.add_callback(callback);
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fit the label encoder on the training labels, train for the configured
    /// number of epochs validating on the test table, and report test metrics.
    pub fn train(&mut self, tables: &SplitTables) -> Result<TrainedModel<B::InnerBackend>> {
        info!("Starting training with configuration: {:?}", self.config);

        if tables.train.is_empty() {
            bail!("Training table is empty");
        }
        if tables.test.is_empty() {
            bail!("Testing table is empty");
        }
        if self.config.batch_size == 0 {
            bail!("Batch size must be positive");
        }

        let start_time = Instant::now();
        let schema = tables.schema().clone();

        let encoder = LabelEncoder::fit(&tables.train.labels());
        info!("Unique diseases: {}", encoder.num_classes());

        let train_dataset = SymptomDataset::from_table(&tables.train, &encoder)?;
        let test_dataset = SymptomDataset::from_table(&tables.test, &encoder)
            .context("Test labels must be a subset of training labels")?;
        let sample = test_dataset.get(0);
        info!(
            "Train shape: ({}, {})  Test shape: ({}, {})",
            train_dataset.len(),
            schema.len(),
            test_dataset.len(),
            schema.len()
        );

        B::seed(self.config.seed);

        let model_config = ModelConfig::symptom_default(schema.len(), encoder.num_classes());
        let mut model: DiseaseClassifier<B> = model_config.init(&self.device);
        let mut optim = AdamConfig::new().init::<B, DiseaseClassifier<B>>();

        let num_batches = train_dataset.len().div_ceil(self.config.batch_size);
        let train_loader = DataLoaderBuilder::new(SymptomBatcher::<B>::new(self.device.clone()))
            .batch_size(self.config.batch_size)
            .shuffle(self.config.seed)
            .num_workers(self.config.num_workers)
            .build(train_dataset);

        let test_loader =
            DataLoaderBuilder::new(SymptomBatcher::<B::InnerBackend>::new(self.device.clone()))
                .batch_size(self.config.batch_size)
                .num_workers(self.config.num_workers)
                .build(test_dataset);

        let mut state = TrainingState::new();
        self.callbacks.on_train_begin(self.config.epochs);

        for epoch in 0..self.config.epochs {
            self.callbacks.on_epoch_begin(epoch, num_batches);

            let mut loss_sum = 0.0f64;
            let mut batches = 0usize;

            for (batch_idx, batch) in train_loader.iter().enumerate() {
                let output = model.forward_classification(batch.inputs, batch.targets);
                let loss_val: f64 = output.loss.clone().into_scalar().elem::<f64>();

                let grads = output.loss.backward();
                let grads = GradientsParams::from_grads(grads, &model);
                model = optim.step(self.config.learning_rate, model, grads);

                loss_sum += loss_val;
                batches += 1;
                state.global_step += 1;
                self.callbacks.on_batch_end(batch_idx, loss_val);
            }

            let train_loss = if batches > 0 {
                loss_sum / batches as f64
            } else {
                f64::NAN
            };

            let val = evaluate(&model.valid(), &test_loader);
            state.update_epoch(train_loss, val);
            self.callbacks.on_epoch_end(epoch, train_loss, &val);
        }

        self.callbacks.on_train_end(&state);

        let model = model.valid();
        let final_metrics = evaluate(&model, &test_loader);
        info!("Test Accuracy: {:.2}%", final_metrics.accuracy * 100.0);

        if let Some(item) = sample {
            log_sample_prediction(&model, &encoder, &item.features, item.target, &self.device);
        }

        let summary = TrainingSummary {
            epochs: state.epoch,
            batch_size: self.config.batch_size,
            learning_rate: self.config.learning_rate,
            train_samples: tables.train.len(),
            test_samples: tables.test.len(),
            test_loss: final_metrics.loss,
            test_accuracy: final_metrics.accuracy,
        };
        let metadata = ModelMetadata::new(model_config, schema, summary.clone());

        Ok(TrainedModel {
            model,
            encoder,
            metadata,
            result: TrainingResult {
                state,
                final_metrics,
                summary,
                duration_secs: start_time.elapsed().as_secs_f64(),
            },
        })
    }
}

/// Mean loss and accuracy of `model` over every batch of `loader`
pub fn evaluate<B: Backend>(
    model: &DiseaseClassifier<B>,
    loader: &Arc<dyn DataLoader<SymptomBatch<B>>>,
) -> EpochMetrics {
    let mut loss_sum = 0.0f64;
    let mut batches = 0usize;
    let mut correct = 0usize;
    let mut total = 0usize;

    for batch in loader.iter() {
        total += batch.targets.dims()[0];
        let output = model.forward_classification(batch.inputs, batch.targets);

        loss_sum += output.loss.into_scalar().elem::<f64>();
        batches += 1;

        // argmax keeps the reduced dim: [batch, 1]
        let predicted = output.logits.argmax(1).flatten::<1>(0, 1);
        let hits: i64 = predicted.equal(output.targets).int().sum().into_scalar().elem::<i64>();
        correct += hits as usize;
    }

    EpochMetrics {
        loss: if batches > 0 { loss_sum / batches as f64 } else { f64::NAN },
        accuracy: if total > 0 { correct as f64 / total as f64 } else { 0.0 },
    }
}

fn log_sample_prediction<B: Backend>(
    model: &DiseaseClassifier<B>,
    encoder: &LabelEncoder,
    features: &[f32],
    target: usize,
    device: &B::Device,
) {
    let input = Tensor::<B, 1>::from_floats(features, device).reshape([1, features.len()]);
    let predicted = model
        .predict_proba(input)
        .argmax(1)
        .into_scalar()
        .elem::<i64>() as usize;

    match (encoder.decode(predicted), encoder.decode(target)) {
        (Ok(predicted), Ok(actual)) => {
            info!("Sample check: predicted '{}', actual '{}'", predicted, actual)
        }
        _ => debug!("Sample check skipped: class index out of range"),
    }
}
