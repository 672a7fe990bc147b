use crate::model::ModelConfig;
use burn::nn::loss::CrossEntropyLossConfig;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation::{relu, softmax};

/// Feed-forward disease classifier
#[derive(Module, Debug)]
pub struct DiseaseClassifier<B: Backend> {
    /// First fully connected layer
    fc1: Linear<B>,
    /// Dropout after the first layer
    dropout1: Dropout,
    /// Second fully connected layer
    fc2: Linear<B>,
    /// Dropout after the second layer
    dropout2: Dropout,
    /// Output layer, one logit per class
    output: Linear<B>,
}

/// Classification output with loss
#[derive(Debug)]
pub struct ClassificationOutput<B: Backend> {
    pub loss: Tensor<B, 1>,
    pub logits: Tensor<B, 2>,
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> DiseaseClassifier<B> {
    /// Forward pass returning logits `[batch_size, num_classes]`
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.fc1.forward(input);
        let x = relu(x);
        let x = self.dropout1.forward(x);

        let x = self.fc2.forward(x);
        let x = relu(x);
        let x = self.dropout2.forward(x);

        self.output.forward(x)
    }

    /// Forward pass with sparse categorical cross-entropy against integer targets
    pub fn forward_classification(
        &self,
        input: Tensor<B, 2>,
        targets: Tensor<B, 1, Int>,
    ) -> ClassificationOutput<B> {
        let logits = self.forward(input);
        let loss = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), targets.clone());

        ClassificationOutput { loss, logits, targets }
    }

    /// Class probabilities, rows sum to 1
    pub fn predict_proba(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        softmax(self.forward(input), 1)
    }
}

impl ModelConfig {
    /// Initialize the classifier
    pub fn init<B: Backend>(&self, device: &B::Device) -> DiseaseClassifier<B> {
        let fc1 = LinearConfig::new(self.input_size, self.hidden_size_1)
            .with_bias(true)
            .init(device);

        let fc2 = LinearConfig::new(self.hidden_size_1, self.hidden_size_2)
            .with_bias(true)
            .init(device);

        let output = LinearConfig::new(self.hidden_size_2, self.num_classes)
            .with_bias(true)
            .init(device);

        DiseaseClassifier {
            fc1,
            dropout1: DropoutConfig::new(self.dropout_1).init(),
            fc2,
            dropout2: DropoutConfig::new(self.dropout_2).init(),
            output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_model_forward() {
        let device = <TestBackend as Backend>::Device::default();
        let model = ModelConfig::symptom_default(132, 41).init::<TestBackend>(&device);

        let input = Tensor::<TestBackend, 2>::zeros([2, 132], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [2, 41]);
    }

    #[test]
    fn test_predict_proba_sums_to_one() {
        let device = <TestBackend as Backend>::Device::default();
        let model = ModelConfig::small(10, 5).init::<TestBackend>(&device);

        let input = Tensor::<TestBackend, 2>::ones([3, 10], &device);
        let probs = model.predict_proba(input);
        assert_eq!(probs.dims(), [3, 5]);

        let sums = probs.sum_dim(1).into_data().to_vec::<f32>().unwrap();
        for s in sums {
            assert!((s - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_forward_classification_loss() {
        let device = <TestBackend as Backend>::Device::default();
        let model = ModelConfig::small(4, 3).init::<TestBackend>(&device);

        let input = Tensor::<TestBackend, 2>::zeros([2, 4], &device);
        let targets = Tensor::<TestBackend, 1, Int>::from_ints([0, 2], &device);
        let output = model.forward_classification(input, targets);

        assert_eq!(output.loss.dims(), [1]);
        assert_eq!(output.logits.dims(), [2, 3]);
        let loss: f32 = output.loss.into_scalar().elem();
        assert!(loss.is_finite() && loss > 0.0);
    }
}
