pub mod predictor;

use serde::{Deserialize, Serialize};

pub use predictor::{BurnClassifier, Predictor, SymptomClassifier};

/// Number of ranked diseases returned per entry
pub const TOP_K: usize = 3;

/// One ranked disease suggestion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiseasePrediction {
    /// Disease name
    pub disease: String,
    /// Predicted probability as a percentage, two decimals
    pub confidence: f64,
    /// Suggested specialist
    pub doctor: String,
}

impl DiseasePrediction {
    pub fn new(disease: String, probability: f32, doctor: String) -> Self {
        Self {
            disease,
            confidence: to_percentage(probability),
            doctor,
        }
    }
}

/// Probability in [0, 1] to a percentage rounded to two decimals
pub fn to_percentage(probability: f32) -> f64 {
    (f64::from(probability) * 100.0 * 100.0).round() / 100.0
}

/// Why an entry produced no predictions
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum PredictError {
    #[error("No symptoms provided")]
    NoSymptoms,
    #[error("No valid symptoms recognized")]
    NoValidSymptoms,
    #[error("Prediction failed")]
    Inference(String),
}

/// Outcome for one free-text entry
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum EntryResponse {
    Results {
        input: String,
        results: Vec<DiseasePrediction>,
    },
    Error {
        input: String,
        error: String,
    },
}

impl EntryResponse {
    pub fn new(input: &str, outcome: Result<Vec<DiseasePrediction>, PredictError>) -> Self {
        match outcome {
            Ok(results) => EntryResponse::Results {
                input: input.to_string(),
                results,
            },
            Err(e) => EntryResponse::Error {
                input: input.to_string(),
                error: e.to_string(),
            },
        }
    }

    pub fn input(&self) -> &str {
        match self {
            EntryResponse::Results { input, .. } | EntryResponse::Error { input, .. } => input,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, EntryResponse::Error { .. })
    }
}

/// Reply to a chat request.
///
/// A request with exactly one entry gets the bare entry object, anything
/// else is wrapped in `{"responses": [...]}`. Existing clients rely on this.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ChatResponse {
    Single(EntryResponse),
    Batch { responses: Vec<EntryResponse> },
}

impl ChatResponse {
    pub fn from_entries(mut entries: Vec<EntryResponse>) -> Self {
        if entries.len() == 1 {
            if let Some(entry) = entries.pop() {
                return ChatResponse::Single(entry);
            }
        }
        ChatResponse::Batch { responses: entries }
    }

    pub fn entries(&self) -> &[EntryResponse] {
        match self {
            ChatResponse::Single(entry) => std::slice::from_ref(entry),
            ChatResponse::Batch { responses } => responses,
        }
    }
}
