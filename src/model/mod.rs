pub mod architecture;
pub mod checkpoint;

use burn::prelude::*;

/// Model configuration
#[derive(Config, Debug)]
pub struct ModelConfig {
    /// Number of input features (symptom schema length)
    pub input_size: usize,

    /// Number of disease classes
    pub num_classes: usize,

    /// Number of hidden units in first layer
    #[config(default = "256")]
    pub hidden_size_1: usize,

    /// Number of hidden units in second layer
    #[config(default = "128")]
    pub hidden_size_2: usize,

    /// Dropout rate after the first hidden layer
    #[config(default = "0.4")]
    pub dropout_1: f64,

    /// Dropout rate after the second hidden layer
    #[config(default = "0.3")]
    pub dropout_2: f64,
}

impl ModelConfig {
    /// Two-hidden-layer network sized for a symptom schema and class count
    pub fn symptom_default(input_size: usize, num_classes: usize) -> Self {
        Self::new(input_size, num_classes)
    }

    /// Create a smaller model for faster training
    pub fn small(input_size: usize, num_classes: usize) -> Self {
        Self::new(input_size, num_classes)
            .with_hidden_size_1(64)
            .with_hidden_size_2(32)
            .with_dropout_1(0.2)
            .with_dropout_2(0.1)
    }
}
