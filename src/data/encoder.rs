use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use tracing::info;

/// Label encoding errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EncoderError {
    #[error("label '{0}' was not seen when the encoder was fit")]
    UnknownLabel(String),
    #[error("class index {index} is out of range for {num_classes} classes")]
    UnknownIndex { index: usize, num_classes: usize },
}

/// Bijection between disease names and dense class indices.
///
/// Classes are kept in lexicographic order so the same training labels
/// always produce the same indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "EncoderFile", into = "EncoderFile")]
pub struct LabelEncoder {
    classes: Vec<String>,
    index: HashMap<String, usize>,
}

#[derive(Serialize, Deserialize)]
struct EncoderFile {
    classes: Vec<String>,
}

impl From<EncoderFile> for LabelEncoder {
    fn from(file: EncoderFile) -> Self {
        Self::from_classes(file.classes)
    }
}

impl From<LabelEncoder> for EncoderFile {
    fn from(encoder: LabelEncoder) -> Self {
        Self {
            classes: encoder.classes,
        }
    }
}

impl LabelEncoder {
    /// Fit on the distinct values of a label column
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> Self {
        let distinct: BTreeSet<&str> = labels.iter().map(|l| l.as_ref()).collect();
        Self::from_classes(distinct.into_iter().map(str::to_string).collect())
    }

    fn from_classes(classes: Vec<String>) -> Self {
        let index = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self { classes, index }
    }

    /// Class names, indexed by class id
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn encode(&self, label: &str) -> Result<usize, EncoderError> {
        self.index
            .get(label)
            .copied()
            .ok_or_else(|| EncoderError::UnknownLabel(label.to_string()))
    }

    pub fn decode(&self, index: usize) -> Result<&str, EncoderError> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or(EncoderError::UnknownIndex {
                index,
                num_classes: self.classes.len(),
            })
    }

    /// Encode a label column. Fails on the first unseen label.
    pub fn transform<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>, EncoderError> {
        labels.iter().map(|l| self.encode(l.as_ref())).collect()
    }

    pub fn inverse_transform(&self, indices: &[usize]) -> Result<Vec<String>, EncoderError> {
        indices
            .iter()
            .map(|&i| self.decode(i).map(str::to_string))
            .collect()
    }

    /// Write the encoder as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize label encoder")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write label encoder to {:?}", path))?;
        info!("Saved label encoder ({} classes) to {:?}", self.num_classes(), path);
        Ok(())
    }

    /// Read an encoder written by [`LabelEncoder::save`]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read label encoder from {:?}", path))?;
        serde_json::from_str(&json).context("Failed to parse label encoder")
    }
}
