use anyhow::{bail, Context, Result};
use burn::prelude::*;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::data::{LabelEncoder, SymptomQuery, SymptomSchema};
use crate::doctor::DoctorMapping;
use crate::model::architecture::DiseaseClassifier;
use crate::model::checkpoint::ModelSaver;
use crate::predict::{DiseasePrediction, EntryResponse, PredictError, TOP_K};

/// Anything that turns a symptom vector into class probabilities
pub trait SymptomClassifier: Send + Sync {
    /// Length of every probability vector returned
    fn num_classes(&self) -> usize;

    /// Probabilities for one input vector, in label-encoder order
    fn predict_proba(&self, input: &[f32]) -> Result<Vec<f32>>;
}

/// [`SymptomClassifier`] backed by a burn model.
///
/// Burn modules are not guaranteed to be `Sync`, so the model sits behind a
/// mutex and requests take turns running the forward pass.
pub struct BurnClassifier<B: Backend> {
    model: Mutex<DiseaseClassifier<B>>,
    device: B::Device,
    num_classes: usize,
}

impl<B: Backend> BurnClassifier<B> {
    pub fn new(model: DiseaseClassifier<B>, num_classes: usize, device: B::Device) -> Self {
        Self {
            model: Mutex::new(model),
            device,
            num_classes,
        }
    }
}

impl<B: Backend> SymptomClassifier for BurnClassifier<B> {
    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn predict_proba(&self, input: &[f32]) -> Result<Vec<f32>> {
        let tensor = Tensor::<B, 1>::from_floats(input, &self.device).reshape([1, input.len()]);

        let model = match self.model.lock() {
            Ok(guard) => guard,
            Err(_) => bail!("Model lock poisoned"),
        };
        let probs = model.predict_proba(tensor);
        drop(model);

        probs
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Failed to read probabilities: {:?}", e))
    }
}

/// Inference context: classifier, symptom schema, label encoder and doctor
/// mapping. Immutable once built, so it can be shared across requests.
pub struct Predictor {
    /// Probability model
    classifier: Box<dyn SymptomClassifier>,
    /// Input column order
    schema: SymptomSchema,
    /// Class index to disease name
    encoder: LabelEncoder,
    /// Disease to specialist
    doctors: DoctorMapping,
}

impl Predictor {
    /// Assemble a predictor. The classifier must emit one probability per
    /// encoder class.
    pub fn new(
        classifier: Box<dyn SymptomClassifier>,
        schema: SymptomSchema,
        encoder: LabelEncoder,
        doctors: DoctorMapping,
    ) -> Result<Self> {
        if classifier.num_classes() != encoder.num_classes() {
            bail!(
                "Classifier produces {} classes but the label encoder has {}",
                classifier.num_classes(),
                encoder.num_classes()
            );
        }
        if schema.is_empty() {
            bail!("Symptom schema is empty");
        }

        Ok(Self {
            classifier,
            schema,
            encoder,
            doctors,
        })
    }

    /// Load weights, metadata and encoder from an artifacts directory.
    ///
    /// The doctor mapping comes from `mapping` when given, else from the
    /// default file in `dir` when present, else it is generated from the
    /// encoder classes.
    pub fn from_artifacts<B: Backend>(
        dir: &Path,
        mapping: Option<&Path>,
        device: B::Device,
    ) -> Result<Self> {
        let saver = ModelSaver::new(dir);
        let (model, metadata, encoder) = saver.load::<B>(&device)?;

        let doctors = match mapping {
            Some(path) => DoctorMapping::load(path)?,
            None if saver.mapping_path().exists() => DoctorMapping::load(saver.mapping_path())?,
            None => {
                info!("No doctor mapping found, generating one from disease names");
                DoctorMapping::generate(encoder.classes())
            }
        };

        let classifier = BurnClassifier::new(model, encoder.num_classes(), device);
        Self::new(Box::new(classifier), metadata.symptoms, encoder, doctors)
            .with_context(|| format!("Inconsistent artifacts in {:?}", dir))
    }

    pub fn schema(&self) -> &SymptomSchema {
        &self.schema
    }

    pub fn encoder(&self) -> &LabelEncoder {
        &self.encoder
    }

    pub fn doctors(&self) -> &DoctorMapping {
        &self.doctors
    }

    /// Tokenize free text against the schema
    pub fn parse(&self, raw: &str) -> SymptomQuery {
        self.schema.parse(raw)
    }

    /// Top diseases for a comma-separated symptom string
    pub fn predict(&self, raw: &str) -> Result<Vec<DiseasePrediction>, PredictError> {
        let query = self.parse(raw);
        if query.is_empty() {
            return Err(PredictError::NoSymptoms);
        }
        if !query.ignored.is_empty() {
            warn!("Ignoring unknown symptoms: {:?}", query.ignored);
        }
        if query.valid.is_empty() {
            return Err(PredictError::NoValidSymptoms);
        }

        self.predict_symptoms(&query.valid)
    }

    /// Top diseases for already-tokenized symptom names.
    /// Names outside the schema do not affect the input vector.
    pub fn predict_symptoms<S: AsRef<str>>(
        &self,
        symptoms: &[S],
    ) -> Result<Vec<DiseasePrediction>, PredictError> {
        let input = self.schema.encode(symptoms);
        if input.iter().all(|&v| v == 0.0) {
            return Err(PredictError::NoValidSymptoms);
        }

        let probs = self
            .classifier
            .predict_proba(&input)
            .map_err(|e| PredictError::Inference(e.to_string()))?;
        if probs.len() != self.encoder.num_classes() {
            return Err(PredictError::Inference(format!(
                "expected {} probabilities, got {}",
                self.encoder.num_classes(),
                probs.len()
            )));
        }

        top_k(&probs, TOP_K)
            .into_iter()
            .map(|(index, probability)| {
                let disease = self
                    .encoder
                    .decode(index)
                    .map_err(|e| PredictError::Inference(e.to_string()))?;
                let doctor = self.doctors.specialist_for(disease);
                Ok(DiseasePrediction::new(
                    disease.to_string(),
                    probability,
                    doctor.to_string(),
                ))
            })
            .collect()
    }

    /// Predict for one entry and shape the per-entry response
    pub fn respond(&self, entry: &str) -> EntryResponse {
        let outcome = self.predict(entry);
        match &outcome {
            Err(PredictError::Inference(cause)) => {
                error!("Prediction failed for {:?}: {}", entry, cause)
            }
            Err(e) => debug!("No prediction for {:?}: {}", entry, e),
            Ok(results) => debug!("{} predictions for {:?}", results.len(), entry),
        }
        EntryResponse::new(entry, outcome)
    }
}

/// Indices and values of the `k` largest probabilities, highest first.
/// Ties keep the lower index first.
pub fn top_k(probs: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = probs.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(k.min(probs.len()));
    ranked
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Classifier returning the same probabilities for every input
    pub struct FixedClassifier {
        pub probs: Vec<f32>,
        pub calls: Arc<AtomicUsize>,
    }

    impl FixedClassifier {
        pub fn new(probs: Vec<f32>) -> Self {
            Self {
                probs,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl SymptomClassifier for FixedClassifier {
        fn num_classes(&self) -> usize {
            self.probs.len()
        }

        fn predict_proba(&self, _input: &[f32]) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.probs.clone())
        }
    }

    pub fn schema() -> SymptomSchema {
        SymptomSchema::new(
            ["itching", "skin_rash", "joint_pain", "high_fever", "cough"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap()
    }

    /// Predictor over four diseases with fixed, distinct probabilities,
    /// plus the classifier's call counter
    pub fn counted_predictor() -> (Predictor, Arc<AtomicUsize>) {
        let encoder = LabelEncoder::fit(&["Fungal infection", "Arthritis", "Malaria", "Pneumonia"]);
        // sorted classes: Arthritis, Fungal infection, Malaria, Pneumonia
        let classifier = FixedClassifier::new(vec![0.2, 0.55, 0.05, 0.2]);
        let calls = classifier.calls.clone();
        let doctors = DoctorMapping::generate(encoder.classes());
        let predictor = Predictor::new(Box::new(classifier), schema(), encoder, doctors).unwrap();
        (predictor, calls)
    }

    pub fn predictor() -> Predictor {
        counted_predictor().0
    }

    pub fn call_count(calls: &AtomicUsize) -> usize {
        calls.load(Ordering::SeqCst)
    }
}
