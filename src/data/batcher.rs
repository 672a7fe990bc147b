use anyhow::Result;
use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;

use crate::data::{LabelEncoder, SymptomTable};

/// One encoded training example
#[derive(Debug, Clone)]
pub struct SymptomItem {
    /// One-hot symptom indicators
    pub features: Vec<f32>,
    /// Encoded disease class
    pub target: usize,
}

/// In-memory dataset of encoded examples
pub struct SymptomDataset {
    items: Vec<SymptomItem>,
}

impl SymptomDataset {
    /// Encode a table's labels through an already-fitted encoder
    pub fn from_table(table: &SymptomTable, encoder: &LabelEncoder) -> Result<Self> {
        let targets = encoder.transform(&table.labels())?;
        let items = table
            .records
            .iter()
            .zip(targets)
            .map(|(record, target)| SymptomItem {
                features: record.features.clone(),
                target,
            })
            .collect();
        Ok(Self { items })
    }
}

impl Dataset<SymptomItem> for SymptomDataset {
    fn get(&self, index: usize) -> Option<SymptomItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// A batch of examples stacked into tensors
#[derive(Debug, Clone)]
pub struct SymptomBatch<B: Backend> {
    /// Shape `[batch_size, num_symptoms]`
    pub inputs: Tensor<B, 2>,
    /// Shape `[batch_size]`
    pub targets: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct SymptomBatcher<B: Backend> {
    device: B::Device,
}

impl<B: Backend> SymptomBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<SymptomItem, SymptomBatch<B>> for SymptomBatcher<B> {
    fn batch(&self, items: Vec<SymptomItem>) -> SymptomBatch<B> {
        let batch_size = items.len();
        let num_features = items.first().map(|i| i.features.len()).unwrap_or(0);

        let flat: Vec<f32> = items
            .iter()
            .flat_map(|item| item.features.iter().copied())
            .collect();
        let targets: Vec<i32> = items.iter().map(|item| item.target as i32).collect();

        let inputs = Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device)
            .reshape([batch_size, num_features]);
        let targets = Tensor::<B, 1, Int>::from_ints(targets.as_slice(), &self.device);

        SymptomBatch { inputs, targets }
    }
}
