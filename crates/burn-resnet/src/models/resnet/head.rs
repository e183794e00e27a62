//! # `ResNet` Classifier Head
//!
//! A [`ClassifierHead`] is the dense layer terminating the network,
//! fused with its output activation:
//!
//! * [`ClassifierMode::Categorical`]: softmax over `num_outputs` classes.
//! * [`ClassifierMode::Binary`]: sigmoid over a single output.

use crate::models::resnet::util::DENSE_INITIALIZER;
use bimm_contracts::{assert_shape_contract_periodically, unpack_shape_contract};
use burn::nn::{Initializer, Linear, LinearConfig};
use burn::prelude::{Backend, Config, Module, Tensor};
use burn::tensor::activation::{sigmoid, softmax};

/// Output activation mode of the classifier.
#[derive(Config, Debug, PartialEq, Eq)]
pub enum ClassifierMode {
    /// Softmax over `num_outputs` classes.
    Categorical,

    /// Sigmoid over a single output.
    Binary,
}

/// [`ClassifierHead`] configuration.
#[derive(Config, Debug)]
pub struct ClassifierHeadConfig {
    /// The number of input features.
    pub in_features: usize,

    /// The number of outputs.
    pub num_outputs: usize,

    /// The output activation mode.
    #[config(default = "ClassifierMode::Categorical")]
    pub mode: ClassifierMode,

    /// The dense layer initializer.
    #[config(default = "DENSE_INITIALIZER.clone()")]
    pub initializer: Initializer,
}

impl ClassifierHeadConfig {
    /// Check if the config is valid.
    ///
    /// # Returns
    ///
    /// A `Result<(), String>`
    pub fn try_validate(&self) -> Result<(), String> {
        if self.mode == ClassifierMode::Binary && self.num_outputs != 1 {
            return Err(format!(
                "binary mode requires num_outputs == 1, got {}",
                self.num_outputs,
            ));
        }
        Ok(())
    }

    /// Panic if `try_validate` returns an error.
    pub fn expect_valid(&self) {
        match self.try_validate() {
            Ok(_) => (),
            Err(err) => panic!("{}", err),
        }
    }

    /// Initialize a [`ClassifierHead`].
    pub fn init<B: Backend>(
        self,
        device: &B::Device,
    ) -> ClassifierHead<B> {
        self.expect_valid();

        let fc = LinearConfig::new(self.in_features, self.num_outputs)
            .with_initializer(self.initializer.clone())
            .init(device);

        match self.mode {
            ClassifierMode::Categorical => ClassifierHead::Categorical(fc),
            ClassifierMode::Binary => ClassifierHead::Binary(fc),
        }
    }
}

/// Dense classifier with a fused output activation.
#[derive(Module, Debug)]
pub enum ClassifierHead<B: Backend> {
    /// Softmax classifier.
    Categorical(Linear<B>),

    /// Sigmoid classifier.
    Binary(Linear<B>),
}

impl<B: Backend> ClassifierHead<B> {
    /// The number of input features.
    pub fn in_features(&self) -> usize {
        self.fc().weight.shape().dims[0]
    }

    /// The number of outputs.
    pub fn num_outputs(&self) -> usize {
        self.fc().weight.shape().dims[1]
    }

    fn fc(&self) -> &Linear<B> {
        match self {
            Self::Categorical(fc) => fc,
            Self::Binary(fc) => fc,
        }
    }

    /// Forward pass.
    ///
    /// # Arguments
    ///
    /// - `input`: a ``[batch, in_features]`` tensor.
    ///
    /// # Returns
    ///
    /// A ``[batch, num_outputs]`` tensor of probabilities.
    pub fn forward(
        &self,
        input: Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        let [batch] = unpack_shape_contract!(
            ["batch", "in_features"],
            &input,
            &["batch"],
            &[("in_features", self.in_features())],
        );

        let out = match self {
            Self::Categorical(fc) => softmax(fc.forward(input), 1),
            Self::Binary(fc) => sigmoid(fc.forward(input)),
        };

        assert_shape_contract_periodically!(
            ["batch", "num_outputs"],
            &out,
            &[("batch", batch), ("num_outputs", self.num_outputs())],
        );

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_classifier_head_config() {
        let config = ClassifierHeadConfig::new(512, 1000);
        assert!(matches!(config.mode, ClassifierMode::Categorical));
        assert!(config.try_validate().is_ok());

        let config = config.with_mode(ClassifierMode::Binary);
        assert!(config.try_validate().is_err());

        let config = ClassifierHeadConfig::new(512, 1).with_mode(ClassifierMode::Binary);
        assert!(config.try_validate().is_ok());
    }

    #[test]
    fn test_categorical_head_forward() {
        type B = NdArray<f32>;
        let device = Default::default();

        let batch_size = 2;
        let in_features = 16;
        let num_outputs = 10;

        let head: ClassifierHead<B> =
            ClassifierHeadConfig::new(in_features, num_outputs).init(&device);
        assert!(matches!(head, ClassifierHead::Categorical(_)));
        assert_eq!(head.in_features(), in_features);
        assert_eq!(head.num_outputs(), num_outputs);

        let input = Tensor::ones([batch_size, in_features], &device);
        let output = head.forward(input);

        assert_eq!(output.dims(), [batch_size, num_outputs]);

        // Softmax output is a probability distribution.
        let max: f32 = output.clone().max().into_scalar();
        let min: f32 = output.clone().min().into_scalar();
        assert!(min >= 0.0);
        assert!(max <= 1.0);

        let sum: f32 = output.sum().into_scalar();
        assert!((sum - batch_size as f32).abs() < 1e-4);
    }

    #[test]
    fn test_binary_head_forward() {
        type B = NdArray<f32>;
        let device = Default::default();

        let batch_size = 3;
        let in_features = 16;

        let head: ClassifierHead<B> = ClassifierHeadConfig::new(in_features, 1)
            .with_mode(ClassifierMode::Binary)
            .init(&device);
        assert!(matches!(head, ClassifierHead::Binary(_)));
        assert_eq!(head.num_outputs(), 1);

        let input = Tensor::ones([batch_size, in_features], &device);
        let output = head.forward(input);

        assert_eq!(output.dims(), [batch_size, 1]);

        let max: f32 = output.clone().max().into_scalar();
        let min: f32 = output.min().into_scalar();
        assert!(min > 0.0);
        assert!(max < 1.0);
    }

    #[test]
    #[should_panic(expected = "binary mode requires num_outputs == 1")]
    fn test_binary_head_init_panic() {
        type B = NdArray<f32>;
        let device = Default::default();

        let _head: ClassifierHead<B> = ClassifierHeadConfig::new(16, 4)
            .with_mode(ClassifierMode::Binary)
            .init(&device);
    }
}
